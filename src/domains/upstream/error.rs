//! Upstream fetch errors.

use std::time::Duration;
use thiserror::Error;

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors that can occur while fetching records from the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build upstream client: {0}")]
    Client(String),

    /// The request could not be sent or the connection failed.
    #[error("Upstream request failed: {0}")]
    Request(String),

    /// The upstream answered with a non-success status.
    #[error("HTTP Error {status}: {body}")]
    Status { status: u16, body: String },

    /// The upstream answered with a payload we cannot interpret.
    #[error("Unexpected upstream payload: {0}")]
    Payload(String),

    /// The fetch did not complete within the configured timeout.
    #[error("Upstream request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Payload(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
