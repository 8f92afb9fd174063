//! Error types for copilot-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Invalid window status: {0}")]
    InvalidWindowStatus(String),

    #[error("Invalid policy path: {0}")]
    InvalidPath(String),

    #[error("Invalid JSON in {field}: {source}")]
    InvalidJson {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid time filter: {0}")]
    InvalidTimeFilter(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
