//! Session state in the two backend schemas and the normalized client shape.
//!
//! Consumers only ever see `Session`. The v2 schema carries raw flags and a
//! revision; the v1 schema carries a server-computed mode and counts but no
//! revision.

use serde::{Deserialize, Deserializer, Serialize};

use crate::mode::{derive_mode, Mode, WindowStatus};

/// Snapshot p95 age above which the v2 session is reported as stale (seconds).
pub const STALE_P95_AGE_THRESHOLD_S: f64 = 10.0;

/// Session payload from `GET /api/v2/session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionV2 {
    #[serde(default, deserialize_with = "null_as_default")]
    pub zerodha: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub llm: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticker: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logged_in: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_open: bool,
    /// Missing status is treated as outside the window.
    #[serde(default = "default_window_status", deserialize_with = "nullable_window_status")]
    pub window_status: WindowStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub degraded: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub snapshot_p95_age_s: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_ist: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rev: u64,
}

fn default_window_status() -> WindowStatus {
    WindowStatus::Closed
}

/// Explicit `null` reads like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_window_status<'de, D>(deserializer: D) -> Result<WindowStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<WindowStatus>::deserialize(deserializer)?.unwrap_or_else(default_window_status))
}

impl SessionV2 {
    /// Mode derived from this snapshot.
    #[must_use]
    pub fn mode(&self) -> Mode {
        derive_mode(self.market_open, self.window_status, self.ticker)
    }
}

/// Legacy session payload from `GET /api/session`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionV1 {
    #[serde(default, deserialize_with = "null_as_default")]
    pub zerodha: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub llm: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticker: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_open: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stale_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subscribed_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub universe_limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_time_ist: String,
    /// Server-computed mode. Unknown values are dropped rather than failing the parse.
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: Option<Mode>,
}

fn lenient_mode<'de, D>(deserializer: D) -> Result<Option<Mode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Normalized session shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub zerodha: bool,
    pub llm: bool,
    pub ticker: bool,
    pub stale_count: u32,
    pub subscribed_count: u32,
    pub universe_limit: u32,
    pub market_open: bool,
    pub server_time_ist: String,
    pub mode: Mode,
    /// Server revision (v2). Always 0 when sourced from v1.
    pub rev: u64,
}

/// Binary staleness flag from the snapshot age percentile.
///
/// v1 reports an actual count; v2 only reports an age percentile, so the two
/// are not equivalent. Kept as observed.
#[must_use]
pub fn stale_count_from_age(snapshot_p95_age_s: f64) -> u32 {
    if snapshot_p95_age_s > STALE_P95_AGE_THRESHOLD_S {
        1
    } else {
        0
    }
}

impl Session {
    /// Normalize a v2 session. `universe_limit` comes from `/api/config`.
    #[must_use]
    pub fn from_v2(s: &SessionV2, universe_limit: u32) -> Self {
        Self {
            zerodha: s.zerodha,
            llm: s.llm,
            ticker: s.ticker,
            stale_count: stale_count_from_age(s.snapshot_p95_age_s),
            // v2 does not report subscriptions
            subscribed_count: 0,
            universe_limit,
            market_open: s.market_open,
            server_time_ist: s.time_ist.clone(),
            mode: s.mode(),
            rev: s.rev,
        }
    }

    /// Normalize a v1 session. Revision is pinned at 0.
    #[must_use]
    pub fn from_v1(s: SessionV1) -> Self {
        Self {
            zerodha: s.zerodha,
            llm: s.llm,
            ticker: s.ticker,
            stale_count: s.stale_count,
            subscribed_count: s.subscribed_count,
            universe_limit: s.universe_limit,
            market_open: s.market_open,
            server_time_ist: s.server_time_ist,
            mode: s.mode.unwrap_or(Mode::Historical),
            rev: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_early_window_with_ticker_is_waiting() {
        let v2: SessionV2 = serde_json::from_value(json!({
            "market_open": true,
            "window_status": "early",
            "ticker": true,
            "snapshot_p95_age_s": 3,
            "rev": 5
        }))
        .unwrap();

        let session = Session::from_v2(&v2, 0);
        assert_eq!(session.mode, Mode::Waiting);
        assert_eq!(session.stale_count, 0);
        assert_eq!(session.rev, 5);
    }

    #[test]
    fn test_v2_stale_threshold_is_exclusive() {
        assert_eq!(stale_count_from_age(10.0), 0);
        assert_eq!(stale_count_from_age(10.01), 1);
        assert_eq!(stale_count_from_age(0.0), 0);
    }

    #[test]
    fn test_v2_normalization() {
        let v2 = SessionV2 {
            zerodha: true,
            llm: true,
            ticker: true,
            logged_in: true,
            market_open: true,
            window_status: WindowStatus::Ok,
            degraded: false,
            snapshot_p95_age_s: 42.0,
            time_ist: "2026-10-19T10:15:00+05:30".to_string(),
            rev: 17,
        };

        let session = Session::from_v2(&v2, 300);
        assert_eq!(session.mode, Mode::Live);
        assert_eq!(session.stale_count, 1);
        assert_eq!(session.subscribed_count, 0);
        assert_eq!(session.universe_limit, 300);
        assert_eq!(session.server_time_ist, "2026-10-19T10:15:00+05:30");
        assert_eq!(session.rev, 17);
    }

    #[test]
    fn test_v1_fields_mirror_fixture() {
        let v1: SessionV1 = serde_json::from_value(json!({
            "zerodha": true,
            "llm": false,
            "ticker": true,
            "mode": "LIVE",
            "stale_count": 2
        }))
        .unwrap();

        let session = Session::from_v1(v1);
        assert!(session.zerodha);
        assert!(!session.llm);
        assert!(session.ticker);
        assert_eq!(session.mode, Mode::Live);
        assert_eq!(session.stale_count, 2);
        assert_eq!(session.subscribed_count, 0);
        assert_eq!(session.universe_limit, 0);
        assert_eq!(session.server_time_ist, "");
        assert_eq!(session.rev, 0);
    }

    #[test]
    fn test_v1_missing_or_unknown_mode_is_historical() {
        let v1: SessionV1 = serde_json::from_value(json!({ "mode": "PAUSED" })).unwrap();
        assert_eq!(Session::from_v1(v1).mode, Mode::Historical);

        let v1: SessionV1 = serde_json::from_value(json!({})).unwrap();
        assert_eq!(Session::from_v1(v1).mode, Mode::Historical);
    }

    #[test]
    fn test_v2_missing_window_status_is_waiting() {
        let v2: SessionV2 =
            serde_json::from_value(json!({ "market_open": true, "ticker": true })).unwrap();
        assert_eq!(v2.mode(), Mode::Waiting);
        assert_eq!(v2.rev, 0);
    }

    #[test]
    fn test_v2_nulls_read_as_missing() {
        let v2: SessionV2 = serde_json::from_value(json!({
            "market_open": true,
            "window_status": null,
            "ticker": null,
            "snapshot_p95_age_s": null,
            "time_ist": null,
            "rev": null
        }))
        .unwrap();
        assert!(!v2.ticker);
        assert_eq!(v2.window_status, WindowStatus::Closed);
        assert_eq!(v2.rev, 0);
        assert_eq!(Session::from_v2(&v2, 0).mode, Mode::Waiting);
    }

    #[test]
    fn test_v1_nulls_read_as_missing() {
        let v1: SessionV1 = serde_json::from_value(json!({
            "zerodha": true,
            "stale_count": null,
            "server_time_ist": null,
            "mode": null
        }))
        .unwrap();
        let session = Session::from_v1(v1);
        assert!(session.zerodha);
        assert_eq!(session.stale_count, 0);
        assert_eq!(session.mode, Mode::Historical);
    }

    #[test]
    fn test_session_wire_format() {
        let v1 = SessionV1 {
            mode: Some(Mode::Waiting),
            ..Default::default()
        };
        let value = serde_json::to_value(Session::from_v1(v1)).unwrap();
        assert_eq!(value["mode"], "WAITING");
        assert_eq!(value["rev"], 0);
    }
}
