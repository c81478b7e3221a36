use axum::http::StatusCode;
use thiserror::Error;

/// Failures talking to the reporting API.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no auth token available, sign in first")]
    AuthMissing,

    #[error("request to {path} failed with status {status}")]
    RequestFailed { status: u16, path: String },

    #[error("malformed response from {path}: {source}")]
    DecodeFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request: {0}")]
    ValidationFailed(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        let status = match &err {
            ReportError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ReportError::AuthMissing => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
