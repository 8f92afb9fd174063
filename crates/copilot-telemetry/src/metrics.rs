//! Prometheus metrics for the Co-Pilot client.
//!
//! Covers:
//! - v2 -> v1 fallbacks and total fetch failures per capability
//! - Request latency per capability and schema version
//! - Poll outcomes per concern
//! - Current mode, session revision and revision-hint writes
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, which must crash at startup rather than fail
//! silently. These panics only occur during static initialization.

use copilot_core::Mode;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_counter,
    register_int_gauge, CounterVec, Encoder, GaugeVec, HistogramVec, IntCounter, IntGauge,
    TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// v2 requests that fell back to v1.
/// Labels: capability (session/plan/policy_load/policy_save)
pub static FALLBACK_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "copilot_fallback_total",
        "Requests served by the v1 backend after a v2 failure",
        &["capability"]
    )
    .unwrap()
});

/// Requests where both schema versions failed.
pub static FETCH_FAILED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "copilot_fetch_failed_total",
        "Requests where every backend version failed",
        &["capability"]
    )
    .unwrap()
});

/// Request latency in milliseconds.
pub static REQUEST_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "copilot_request_latency_ms",
        "Backend request latency in milliseconds",
        &["capability", "version"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]
    )
    .unwrap()
});

/// Poll ticks.
/// Labels: concern, outcome (ok/error/discarded/skipped)
pub static POLL_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "copilot_poll_total",
        "Poll ticks by concern and outcome",
        &["concern", "outcome"]
    )
    .unwrap()
});

/// Current mode (1 = active).
pub static MODE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "copilot_mode",
        "Current trading mode (1=active, 0=inactive)",
        &["mode"]
    )
    .unwrap()
});

/// Last observed session revision.
pub static SESSION_REV: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("copilot_session_rev", "Last observed session revision").unwrap()
});

/// Revision hint writes.
/// Labels: source (session/policy_save/external)
pub static HINT_WRITES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "copilot_hint_writes_total",
        "Revision hint writes by source",
        &["source"]
    )
    .unwrap()
});

/// Rows in the last plan refresh.
pub static PLAN_ROWS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("copilot_plan_rows", "Rows in the last plan refresh").unwrap()
});

/// Debounced lookups superseded before completing.
pub static DEBOUNCE_SUPERSEDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "copilot_debounce_superseded_total",
        "Debounced lookups discarded because a newer one was triggered"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a v2 -> v1 fallback.
    pub fn fallback(capability: &str) {
        FALLBACK_TOTAL.with_label_values(&[capability]).inc();
    }

    /// Record a request where every version failed.
    pub fn fetch_failed(capability: &str) {
        FETCH_FAILED_TOTAL.with_label_values(&[capability]).inc();
    }

    /// Record request latency.
    pub fn request_latency(capability: &str, version: &str, latency_ms: f64) {
        REQUEST_LATENCY_MS
            .with_label_values(&[capability, version])
            .observe(latency_ms);
    }

    /// Record a poll tick outcome.
    pub fn poll(concern: &str, outcome: &str) {
        POLL_TOTAL.with_label_values(&[concern, outcome]).inc();
    }

    /// Set the current mode. Only the active mode is 1.
    pub fn mode_set(mode: Mode) {
        for m in Mode::ALL {
            MODE.with_label_values(&[m.as_str()])
                .set(if m == mode { 1.0 } else { 0.0 });
        }
    }

    /// Record the observed session revision.
    pub fn session_rev(rev: u64) {
        SESSION_REV.set(i64::try_from(rev).unwrap_or(i64::MAX));
    }

    /// Record a revision hint write.
    pub fn hint_written(source: &str) {
        HINT_WRITES_TOTAL.with_label_values(&[source]).inc();
    }

    /// Record plan size.
    pub fn plan_rows(count: usize) {
        PLAN_ROWS.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record a superseded debounced lookup.
    pub fn debounce_superseded() {
        DEBOUNCE_SUPERSEDED_TOTAL.inc();
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn gather_text() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buf = Vec::new();
    encoder
        .encode(&families, &mut buf)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
}
