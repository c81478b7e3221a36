pub mod app;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod legend;
pub mod models;
pub mod reports;
pub mod state;
pub mod transform;
pub mod view;

#[cfg(test)]
mod test_support;

pub use app::router;
pub use client::{DateRange, ReportingClient, StaticToken, TokenProvider};
pub use config::Config;
pub use errors::ReportError;
pub use state::AppState;
