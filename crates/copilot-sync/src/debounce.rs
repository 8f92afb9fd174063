//! Debounced lookups.
//!
//! Each trigger replaces the pending lookup. A lookup only runs after the
//! delay elapses without another trigger, and its result is dropped if it
//! was superseded while in flight.

use copilot_telemetry::Metrics;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Delay before a triggered lookup runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct Pending {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Debouncer<T> {
    delay: Duration,
    pending: Mutex<Option<Pending>>,
    results: Arc<watch::Sender<Option<T>>>,
}

impl<T> Debouncer<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(delay: Duration) -> Self {
        let (results, _) = watch::channel(None);
        Self {
            delay,
            pending: Mutex::new(None),
            results: Arc::new(results),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `lookup`, superseding any pending one.
    pub fn trigger<Fut>(&self, lookup: Fut)
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let delay = self.delay;
        let results = Arc::clone(&self.results);

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
            tokio::select! {
                biased;
                () = token.cancelled() => trace!("Debounced lookup discarded"),
                value = lookup => {
                    if !token.is_cancelled() {
                        results.send_replace(Some(value));
                    }
                }
            }
        });

        let previous = self.pending.lock().replace(Pending { cancel, handle });
        if let Some(previous) = previous {
            Self::supersede(previous);
        }
    }

    /// Drop the pending lookup, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            Self::supersede(previous);
        }
    }

    fn supersede(previous: Pending) {
        if !previous.handle.is_finished() {
            Metrics::debounce_superseded();
        }
        previous.cancel.cancel();
    }

    /// Latest delivered result.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.results.subscribe()
    }
}

impl<T: Clone> Debouncer<T> {
    pub fn latest(&self) -> Option<T> {
        self.results.borrow().clone()
    }
}

impl<T> Default for Debouncer<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().take() {
            pending.cancel.cancel();
        }
    }
}
