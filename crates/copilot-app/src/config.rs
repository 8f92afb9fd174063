//! Application configuration.

use copilot_client::ClientConfig;
use copilot_core::{PollCadence, PollConcern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Config file used when neither `--config` nor `COPILOT_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Overrides `api_base_url`.
pub const API_BASE_ENV: &str = "COPILOT_API_BASE";

/// Poll cadences per concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "default_session_cadence")]
    pub session: PollCadence,
    #[serde(default = "default_plan_cadence")]
    pub plan: PollCadence,
}

fn default_session_cadence() -> PollCadence {
    PollConcern::Session.default_cadence()
}

fn default_plan_cadence() -> PollCadence {
    PollConcern::Plan.default_cadence()
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            session: default_session_cadence(),
            plan: default_plan_cadence(),
        }
    }
}

/// Metrics and snapshot HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Serve `/metrics` and `/api/snapshot` during `watch`.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_port() -> u16 {
    9100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_server_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend origin. `COPILOT_API_BASE` wins when set.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Plan rows requested per refresh.
    #[serde(default = "default_plan_top")]
    pub plan_top: u32,
    /// Holds the persisted revision hint.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Minimum gap between plan refreshes (ms).
    #[serde(default = "default_plan_min_gap_ms")]
    pub plan_min_gap_ms: u64,
    /// How often the hint file is re-read for writes from other processes (ms).
    #[serde(default = "default_hint_watch_interval_ms")]
    pub hint_watch_interval_ms: u64,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub cadence: CadenceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_plan_top() -> u32 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_plan_min_gap_ms() -> u64 {
    1_500
}

fn default_hint_watch_interval_ms() -> u64 {
    1_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            plan_top: default_plan_top(),
            data_dir: default_data_dir(),
            plan_min_gap_ms: default_plan_min_gap_ms(),
            hint_watch_interval_ms: default_hint_watch_interval_ms(),
            log_level: None,
            cadence: CadenceConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration.
    ///
    /// An explicit path (flag or `COPILOT_CONFIG`) must exist. The default
    /// path is optional; built-in defaults apply when it is missing.
    /// `COPILOT_API_BASE` is applied last.
    pub fn load(explicit: Option<&str>) -> AppResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH)?,
            None => Self::default(),
        };

        config.apply_env_override(std::env::var(API_BASE_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace the base URL with a non-empty override.
    pub fn apply_env_override(&mut self, api_base: Option<String>) {
        if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
            self.api_base_url = base.trim().to_string();
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "api_base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        for (name, cadence) in [("session", &self.cadence.session), ("plan", &self.cadence.plan)] {
            if cadence.live_ms == 0 || cadence.idle_ms == 0 {
                return Err(AppError::Config(format!("cadence.{name} intervals must be > 0")));
            }
        }
        if self.plan_top == 0 {
            return Err(AppError::Config("plan_top must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout_ms: self.request_timeout_ms,
            plan_top: self.plan_top,
        }
    }

    pub fn plan_min_gap(&self) -> Duration {
        Duration::from_millis(self.plan_min_gap_ms)
    }

    pub fn hint_watch_interval(&self) -> Duration {
        Duration::from_millis(self.hint_watch_interval_ms)
    }
}
