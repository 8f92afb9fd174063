//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Client(#[from] copilot_client::ClientError),

    #[error("Sync error: {0}")]
    Sync(#[from] copilot_sync::SyncError),

    #[error("Invalid input: {0}")]
    Input(#[from] copilot_core::CoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] copilot_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
