//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, without trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Plan rows requested per refresh.
    #[serde(default = "default_plan_top")]
    pub plan_top: u32,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_plan_top() -> u32 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            plan_top: default_plan_top(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with default timeout and plan size.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
