//! Debounced metric explanations.
//!
//! Hovering across metrics fires a lookup per metric. Only the last one
//! within the debounce window reaches the backend, and an answer for a
//! metric the user already moved away from is never shown.

use copilot_client::HintSource;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE};

/// Explanation delivered for one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricHint {
    pub metric: String,
    /// Empty when the backend has nothing or the lookup failed.
    pub text: String,
}

pub struct MetricHints<H: ?Sized> {
    source: Arc<H>,
    debouncer: Debouncer<MetricHint>,
}

impl<H> MetricHints<H>
where
    H: HintSource + ?Sized + 'static,
{
    pub fn new(source: Arc<H>) -> Self {
        Self::with_delay(source, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(source: Arc<H>, delay: Duration) -> Self {
        Self {
            source,
            debouncer: Debouncer::new(delay),
        }
    }

    /// Ask for `metric`, superseding any lookup still pending.
    pub fn request(&self, metric: impl Into<String>, context: Value) {
        let source = Arc::clone(&self.source);
        let metric = metric.into();
        self.debouncer.trigger(async move {
            let text = match source.fetch_hint(&metric, &context).await {
                Ok(text) => text,
                Err(e) => {
                    debug!(metric = %metric, error = %e, "Hint lookup failed");
                    String::new()
                }
            };
            MetricHint { metric, text }
        });
    }

    /// Drop the pending lookup, e.g. when the pointer leaves the metric.
    pub fn cancel(&self) {
        self.debouncer.cancel();
    }

    pub fn latest(&self) -> Option<MetricHint> {
        self.debouncer.latest()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<MetricHint>> {
        self.debouncer.subscribe()
    }
}
