//! Ranked trading candidates.
//!
//! Rows are kept exactly as the backend sent them. Accessors read the known
//! fields and return `None` when a field is missing or has the wrong type, so a
//! malformed row still reaches the consumer instead of failing the whole list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

/// Volatility regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    Calm,
    Normal,
    Hot,
}

/// Entry readiness bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Readiness {
    Ready,
    Near,
    Wait,
    Stale,
    Blocked,
}

/// One ranked candidate, as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanRow(Value);

impl PlanRow {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Underlying JSON.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// Row identity.
    pub fn symbol(&self) -> Option<&str> {
        self.0.get("symbol").and_then(Value::as_str)
    }

    pub fn side(&self) -> Option<Side> {
        self.typed("side")
    }

    pub fn score(&self) -> Option<f64> {
        self.number("score")
    }

    pub fn confidence(&self) -> Option<f64> {
        self.number("confidence")
    }

    /// Signal age in seconds.
    pub fn age_s(&self) -> Option<f64> {
        self.number("age_s")
    }

    /// Distance to trigger in basis points.
    pub fn delta_trigger_bps(&self) -> Option<f64> {
        self.number("delta_trigger_bps")
    }

    pub fn regime(&self) -> Option<Regime> {
        self.typed("regime")
    }

    pub fn readiness(&self) -> Option<Readiness> {
        self.typed("readiness")
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.0.get("block_reason").and_then(Value::as_str)
    }

    /// Named boolean checks; non-boolean entries are skipped.
    pub fn checks(&self) -> BTreeMap<String, bool> {
        self.0
            .get("checks")
            .and_then(Value::as_object)
            .map(|checks| {
                checks
                    .iter()
                    .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    fn typed<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl From<Value> for PlanRow {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}
