//! Client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connect, timeout, TLS.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded as JSON.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Body decoded but is not the expected shape.
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
