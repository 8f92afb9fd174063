//! Trading mode derivation.
//!
//! The mode is recomputed from scratch on every poll from the latest
//! session flags; no transition depends on the previous mode.
//! Used for:
//! - Poll cadence selection (tight while LIVE, relaxed otherwise)
//! - Mode banners and live/historical view switching

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// Derived market / trading-readiness state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Market open, intraday window ok, ticker delivering ticks.
    Live,
    /// Market open but outside the entry window or ticker not flowing yet.
    Waiting,
    /// Market closed.
    Historical,
}

impl Mode {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Waiting => "WAITING",
            Self::Historical => "HISTORICAL",
        }
    }

    /// All modes, in display order.
    pub const ALL: [Mode; 3] = [Mode::Live, Mode::Waiting, Mode::Historical];

    #[must_use]
    pub fn is_live(&self) -> bool {
        *self == Self::Live
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LIVE" => Ok(Self::Live),
            "WAITING" => Ok(Self::Waiting),
            "HISTORICAL" => Ok(Self::Historical),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}

/// Intraday entry-window status reported by the v2 backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    Ok,
    /// Before the entry window opens.
    Early,
    /// After the entry window closed.
    Closed,
}

impl WindowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Early => "early",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowStatus {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ok" => Ok(Self::Ok),
            "early" => Ok(Self::Early),
            "closed" => Ok(Self::Closed),
            other => Err(CoreError::InvalidWindowStatus(other.to_string())),
        }
    }
}

/// Derive the trading mode from the raw session flags.
///
/// - market closed => HISTORICAL
/// - window not ok => WAITING
/// - ticker flowing => LIVE, otherwise WAITING
#[must_use]
pub fn derive_mode(market_open: bool, window_status: WindowStatus, ticker: bool) -> Mode {
    if !market_open {
        return Mode::Historical;
    }
    if window_status != WindowStatus::Ok {
        return Mode::Waiting;
    }
    if ticker {
        Mode::Live
    } else {
        Mode::Waiting
    }
}
