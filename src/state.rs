use crate::client::{ReportingClient, StaticToken};
use crate::config::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub client: ReportingClient,
}

impl AppState {
    pub fn new(client: ReportingClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Self {
        let tokens = Arc::new(StaticToken(config.api_token.clone()));
        Self::new(ReportingClient::new(config.api_base_url.clone(), tokens))
    }
}
