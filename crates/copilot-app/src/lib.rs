//! Intraday Co-Pilot command-line client.
//!
//! Orchestrates the client crates:
//! - Session and plan polling with mode-dependent cadence
//! - Policy and universe-config editing
//! - Revision hint persistence shared across processes
//! - Optional `/metrics` and `/api/snapshot` endpoints

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;

pub use app::Application;
pub use cli::{Cli, Command, ConfigCommand, PolicyCommand};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
