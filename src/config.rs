use std::env;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub port: u16,
}

#[derive(Debug, thiserror::Error)]
#[error("REPORTING_API_BASE_URL is not set")]
pub struct MissingBaseUrl;

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, MissingBaseUrl> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, MissingBaseUrl> {
        let api_base_url = resolve_base_url(&var)?;
        let api_token = var("REPORTING_API_TOKEN").filter(|token| !token.trim().is_empty());
        let port = var("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            api_base_url,
            api_token,
            port,
        })
    }
}

fn resolve_base_url(var: &impl Fn(&str) -> Option<String>) -> Result<String, MissingBaseUrl> {
    var("REPORTING_API_BASE_URL")
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .ok_or(MissingBaseUrl)
}
