//! Sync layer error types.

use copilot_client::ClientError;
use copilot_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Backend error: {0}")]
    Client(#[from] ClientError),

    #[error("Policy edit rejected: {0}")]
    Policy(#[from] CoreError),

    #[error("Hint store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No policy loaded")]
    NotLoaded,
}

pub type SyncResult<T> = Result<T, SyncError>;
