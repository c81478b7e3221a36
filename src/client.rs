use crate::errors::ReportError;
use chrono::{Datelike, Months, NaiveDate};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Source of the bearer token sent with every reporting API request.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A token fixed at construction time, e.g. read from the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Inclusive date range sent as `from`/`to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// First day of `today`'s month through `today`.
    pub fn current_month(today: NaiveDate) -> Self {
        let from = today.with_day(1).unwrap_or(today);
        Self { from, to: today }
    }

    /// Three calendar months back through `today`.
    pub fn last_three_months(today: NaiveDate) -> Self {
        let from = today.checked_sub_months(Months::new(3)).unwrap_or(today);
        Self { from, to: today }
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.from > self.to {
            return Err(ReportError::ValidationFailed(format!(
                "date 'from' ({}) is after date 'to' ({})",
                self.from, self.to
            )));
        }
        Ok(())
    }

    pub fn query(&self) -> Vec<(String, String)> {
        vec![
            ("from".to_string(), date_param(self.from)),
            ("to".to_string(), date_param(self.to)),
        ]
    }
}

pub fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Authenticated JSON client for the reporting API.
#[derive(Clone)]
pub struct ReportingClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ReportingClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_http(Client::new(), base_url, tokens)
    }

    pub fn with_http(http: Client, base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tokens,
        }
    }

    fn bearer(&self) -> Result<String, ReportError> {
        self.tokens
            .token()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ReportError::AuthMissing)
    }

    /// Sends the GET and checks the status without decoding the body.
    pub async fn send(&self, path: &str, query: &[(String, String)]) -> Result<reqwest::Response, ReportError> {
        let token = self.bearer()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%path, ?query, "reporting api request");

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::RequestFailed {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<T, ReportError> {
        let response = self.send(path, query).await?;
        decode(path, response).await
    }
}

/// Reads the body and decodes it, keeping transport and shape failures apart.
pub async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, ReportError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ReportError::DecodeFailed {
        path: path.to_string(),
        source,
    })
}
