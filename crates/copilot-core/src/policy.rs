//! Policy document.
//!
//! The backend owns the policy schema. The client keeps the document as an
//! ordered JSON object and only interprets the sub-paths it edits; every other
//! key is carried through load -> edit -> save untouched.
//!
//! Edits are path based: missing intermediate objects are created, and an
//! intermediate that is not an object is replaced by an empty object.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Policy document with the backend revision it was read at.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Server revision. `None` when served by the v1 backend.
    pub rev: Option<u64>,
    pub body: PolicyDocument,
}

/// Open-ended policy object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDocument(Map<String, Value>);

/// Scoring weight names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightKey {
    Trend,
    Pullback,
    Vwap,
    Breakout,
    Volume,
}

impl WeightKey {
    pub const ALL: [WeightKey; 5] = [
        WeightKey::Trend,
        WeightKey::Pullback,
        WeightKey::Vwap,
        WeightKey::Breakout,
        WeightKey::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Pullback => "pullback",
            Self::Vwap => "vwap",
            Self::Breakout => "breakout",
            Self::Volume => "volume",
        }
    }
}

/// How non-intraday symbols are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniverseMode {
    /// Drop non-intraday symbols.
    #[default]
    Strict,
    /// Show them but blocked.
    Soft,
    /// Treat them like the rest.
    Off,
}

impl UniverseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Soft => "soft",
            Self::Off => "off",
        }
    }
}

impl FromStr for UniverseMode {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "soft" => Ok(Self::Soft),
            "off" => Ok(Self::Off),
            other => Err(CoreError::InvalidPath(format!("universe.mode={other}"))),
        }
    }
}

/// `universe.*` with display defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseSettings {
    pub exchange: String,
    pub prefer_exchange: String,
    pub allow_series: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub mode: UniverseMode,
    pub min_price: f64,
    pub min_median_1m_vol: f64,
    pub max_spread_bps: f64,
}

/// `entry_window.*` (HH:MM, IST).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryWindow {
    pub start: String,
    pub end: String,
}

/// `bracket.*`, all expressed in ATR multiples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketSettings {
    pub entry_chase_atr: f64,
    pub tp1_atr: f64,
    pub tp2_atr: f64,
    pub stop_vwap_offset_atr: f64,
}

/// Time-of-day filter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilterKind {
    Post11,
    Allday,
    Custom,
}

impl FromStr for TimeFilterKind {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "post11" => Ok(Self::Post11),
            "allday" => Ok(Self::Allday),
            "custom" => Ok(Self::Custom),
            other => Err(CoreError::InvalidTimeFilter(other.to_string())),
        }
    }
}

/// `time_filters.default` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub kind: TimeFilterKind,
    pub start: String,
    pub end: String,
}

const POST11_START: &str = "11:00";
const ALLDAY_START: &str = "09:15";
const SESSION_END: &str = "15:10";

impl TimeFilter {
    pub fn post11() -> Self {
        Self {
            kind: TimeFilterKind::Post11,
            start: POST11_START.to_string(),
            end: SESSION_END.to_string(),
        }
    }

    pub fn allday() -> Self {
        Self {
            kind: TimeFilterKind::Allday,
            start: ALLDAY_START.to_string(),
            end: SESSION_END.to_string(),
        }
    }

    /// Custom window; missing bounds fall back to 11:00 / 15:10.
    pub fn custom(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = parse_hhmm(start.unwrap_or(POST11_START))?;
        let end = parse_hhmm(end.unwrap_or(SESSION_END))?;
        if start >= end {
            return Err(CoreError::InvalidTimeFilter(format!(
                "start {} is not before end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self {
            kind: TimeFilterKind::Custom,
            start: start.format("%H:%M").to_string(),
            end: end.format("%H:%M").to_string(),
        })
    }

    /// Build a filter of the given kind. Bounds only apply to `Custom`.
    pub fn of_kind(kind: TimeFilterKind, start: Option<&str>, end: Option<&str>) -> Result<Self> {
        match kind {
            TimeFilterKind::Post11 => Ok(Self::post11()),
            TimeFilterKind::Allday => Ok(Self::allday()),
            TimeFilterKind::Custom => Self::custom(start, end),
        }
    }
}

/// Strict two-digit `HH:MM`. chrono alone also accepts `9:5`.
fn parse_hhmm(raw: &str) -> Result<NaiveTime> {
    let t = raw.trim();
    let well_formed = t.len() == 5
        && t.bytes()
            .enumerate()
            .all(|(i, b)| if i == 2 { b == b':' } else { b.is_ascii_digit() });
    if !well_formed {
        return Err(CoreError::InvalidTimeFilter(format!("expected HH:MM, got {raw:?}")));
    }
    NaiveTime::parse_from_str(t, "%H:%M")
        .map_err(|_| CoreError::InvalidTimeFilter(format!("expected HH:MM, got {raw:?}")))
}

/// Split comma-separated input into trimmed, non-empty items.
pub fn parse_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a dotted path (`universe.min_price`) into segments.
pub fn parse_path(dotted: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = dotted.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CoreError::InvalidPath(dotted.to_string()));
    }
    Ok(segments)
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value. `null` becomes an empty document; anything else that
    /// is not an object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a nested value.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |cur, key| cur.get(*key))
    }

    /// Write a nested value in place.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            return Err(CoreError::InvalidPath("empty path".to_string()));
        };

        let mut cur = &mut self.0;
        for key in parents {
            let slot = cur
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            cur = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
        cur.insert(last.to_string(), value);
        Ok(())
    }

    /// Copy-on-write edit: returns a new document, leaving `self` untouched.
    pub fn with_path(&self, path: &[&str], value: Value) -> Result<Self> {
        let mut next = self.clone();
        next.set_path(path, value)?;
        Ok(next)
    }

    fn str_or(&self, path: &[&str], default: &str) -> String {
        self.get_path(path)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    fn f64_or(&self, path: &[&str], default: f64) -> f64 {
        self.get_path(path).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Lists may be stored as arrays or as comma-separated strings.
    fn list_or(&self, path: &[&str], default: &[&str]) -> Vec<String> {
        match self.get_path(path) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(text)) => parse_list(text),
            Some(_) => Vec::new(),
            None => default.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn universe(&self) -> UniverseSettings {
        UniverseSettings {
            exchange: self.str_or(&["universe", "exchange"], "NSE"),
            prefer_exchange: self.str_or(&["universe", "prefer_exchange"], "NSE"),
            allow_series: self.list_or(&["universe", "allow_series"], &["EQ"]),
            exclude_patterns: self.list_or(&["universe", "exclude_patterns"], &[]),
            mode: self
                .get_path(&["universe", "mode"])
                .and_then(Value::as_str)
                .and_then(|m| m.parse().ok())
                .unwrap_or_default(),
            min_price: self.f64_or(&["universe", "min_price"], 20.0),
            min_median_1m_vol: self.f64_or(&["universe", "min_median_1m_vol"], 20_000.0),
            max_spread_bps: self.f64_or(&["universe", "max_spread_bps"], 20.0),
        }
    }

    pub fn entry_window(&self) -> EntryWindow {
        EntryWindow {
            start: self.str_or(&["entry_window", "start"], POST11_START),
            end: self.str_or(&["entry_window", "end"], SESSION_END),
        }
    }

    /// Snapshot staleness limit in seconds.
    pub fn staleness_s(&self) -> f64 {
        self.f64_or(&["staleness_s"], 10.0)
    }

    pub fn weight(&self, key: WeightKey) -> f64 {
        self.f64_or(&["weights", key.as_str()], 1.0)
    }

    pub fn bracket(&self) -> BracketSettings {
        BracketSettings {
            entry_chase_atr: self.f64_or(&["bracket", "entry_chase_atr"], 0.15),
            tp1_atr: self.f64_or(&["bracket", "tp1_atr"], 0.75),
            tp2_atr: self.f64_or(&["bracket", "tp2_atr"], 1.5),
            stop_vwap_offset_atr: self.f64_or(&["bracket", "stop_vwap_offset_atr"], 0.5),
        }
    }

    /// Legacy thresholds map, opaque.
    pub fn thresholds(&self) -> Value {
        self.get_path(&["thresholds"])
            .cloned()
            .unwrap_or_else(|| json!({}))
    }

    pub fn default_time_filter(&self) -> Option<TimeFilter> {
        self.get_path(&["time_filters", "default"])
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_weight(&mut self, key: WeightKey, value: f64) -> Result<()> {
        self.set_path(&["weights", key.as_str()], json!(value))
    }

    pub fn set_entry_window(&mut self, window: &EntryWindow) -> Result<()> {
        self.set_path(&["entry_window", "start"], json!(window.start))?;
        self.set_path(&["entry_window", "end"], json!(window.end))
    }

    pub fn set_staleness_s(&mut self, seconds: f64) -> Result<()> {
        self.set_path(&["staleness_s"], json!(seconds))
    }

    pub fn set_universe_mode(&mut self, mode: UniverseMode) -> Result<()> {
        self.set_path(&["universe", "mode"], json!(mode.as_str()))
    }

    pub fn set_allow_series(&mut self, text: &str) -> Result<()> {
        self.set_path(&["universe", "allow_series"], json!(parse_list(text)))
    }

    pub fn set_exclude_patterns(&mut self, text: &str) -> Result<()> {
        self.set_path(&["universe", "exclude_patterns"], json!(parse_list(text)))
    }

    /// Replace `thresholds` from raw JSON text. Invalid JSON leaves the
    /// document unchanged. Empty text clears it to `{}`.
    pub fn set_thresholds_json(&mut self, text: &str) -> Result<()> {
        let text = if text.trim().is_empty() { "{}" } else { text };
        let parsed: Value = serde_json::from_str(text).map_err(|source| CoreError::InvalidJson {
            field: "thresholds".to_string(),
            source,
        })?;
        self.set_path(&["thresholds"], parsed)
    }

    /// Set `time_filters.default`, keeping sibling filters.
    pub fn set_default_time_filter(&mut self, filter: &TimeFilter) -> Result<()> {
        let value = serde_json::to_value(filter).map_err(|source| CoreError::InvalidJson {
            field: "time_filters.default".to_string(),
            source,
        })?;
        self.set_path(&["time_filters", "default"], value)
    }
}
