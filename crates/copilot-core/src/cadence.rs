//! Mode-dependent poll cadence.
//!
//! Every consumer picks its timer period through `PollCadence::interval_for`
//! so the LIVE / non-LIVE split lives in one place.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::mode::Mode;

/// What a poller is refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollConcern {
    Session,
    Plan,
    TradeRoomPlan,
    Bars,
    LiveQuotes,
}

impl PollConcern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Plan => "plan",
            Self::TradeRoomPlan => "trade_room_plan",
            Self::Bars => "bars",
            Self::LiveQuotes => "live_quotes",
        }
    }

    /// Default cadence for this concern.
    #[must_use]
    pub fn default_cadence(&self) -> PollCadence {
        match self {
            Self::Session => PollCadence::from_millis(5_000, 10_000),
            Self::Plan => PollCadence::from_millis(8_000, 15_000),
            Self::TradeRoomPlan => PollCadence::from_millis(10_000, 20_000),
            Self::Bars => PollCadence::from_millis(5_000, 12_000),
            Self::LiveQuotes => PollCadence::from_millis(3_000, 10_000),
        }
    }
}

impl std::fmt::Display for PollConcern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poll intervals while LIVE and while WAITING / HISTORICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCadence {
    /// Interval while mode is LIVE (ms).
    pub live_ms: u64,
    /// Interval for every other mode, and before the first session (ms).
    pub idle_ms: u64,
}

impl PollCadence {
    pub const fn from_millis(live_ms: u64, idle_ms: u64) -> Self {
        Self { live_ms, idle_ms }
    }

    /// Interval for the given mode. `None` means no session has been seen yet.
    #[must_use]
    pub fn interval_for(&self, mode: Option<Mode>) -> Duration {
        match mode {
            Some(Mode::Live) => Duration::from_millis(self.live_ms),
            _ => Duration::from_millis(self.idle_ms),
        }
    }
}

impl Default for PollCadence {
    fn default() -> Self {
        PollConcern::Session.default_cadence()
    }
}
