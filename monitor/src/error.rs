use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failure to obtain a usable snapshot batch.
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("fixture read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed batch: {0}")]
    Malformed(String),

    #[error("producer returned an empty batch")]
    Empty,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DriverError {
    #[error("background driver is already running")]
    AlreadyRunning,
}

/// Startup configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var}={value:?} is not valid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("POLL_INTERVAL_SECS must be non-zero")]
    ZeroPollInterval,

    #[error(transparent)]
    Detection(#[from] market::ConfigError),
}

/// Errors surfaced by REST handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("market data unavailable: {0}")]
    Producer(#[from] ProducerError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Producer(e) => {
                tracing::warn!(error = %e, "request failed upstream");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
