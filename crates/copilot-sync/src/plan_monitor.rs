//! Plan polling with revision-hint refreshes.

use chrono::{DateTime, Utc};
use copilot_client::PlanSource;
use copilot_core::{Mode, PlanRow, PollConcern};
use copilot_telemetry::Metrics;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::hint::RevisionHintStore;
use crate::poller::{PollOutcome, Poller, PollerConfig};

/// Refreshes closer together than this are skipped.
pub const DEFAULT_MIN_REFRESH_GAP: Duration = Duration::from_millis(1_500);

/// Rows from one successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSnapshot {
    pub rows: Vec<PlanRow>,
    pub fetched_at: DateTime<Utc>,
}

/// Plan monitor settings.
#[derive(Debug, Clone, Copy)]
pub struct PlanMonitorConfig {
    pub poller: PollerConfig,
    pub top: u32,
    pub min_gap: Duration,
}

impl PlanMonitorConfig {
    /// Plan list defaults: 8s/15s cadence, immediate refresh on mode change.
    pub fn new(top: u32) -> Self {
        Self {
            poller: PollerConfig::new(PollConcern::Plan).tick_on_mode_change(true),
            top,
            min_gap: DEFAULT_MIN_REFRESH_GAP,
        }
    }
}

/// Shared refresh state between the timer and the hint listener.
struct Refresher<P: ?Sized> {
    source: Arc<P>,
    top: u32,
    min_gap: Duration,
    last_started: Mutex<Option<Instant>>,
    tx: watch::Sender<Option<PlanSnapshot>>,
}

impl<P: PlanSource + ?Sized> Refresher<P> {
    async fn refresh(&self, reason: &'static str) -> PollOutcome {
        {
            let mut last = self.last_started.lock();
            let now = Instant::now();
            if let Some(prev) = *last {
                if now.duration_since(prev) < self.min_gap {
                    debug!(reason, "Plan refresh skipped, too soon after previous");
                    return PollOutcome::Skipped;
                }
            }
            *last = Some(now);
        }

        match self.source.fetch_plan_rows(self.top).await {
            Ok(rows) => {
                debug!(reason, rows = rows.len(), "Plan refreshed");
                Metrics::plan_rows(rows.len());
                self.tx.send_replace(Some(PlanSnapshot {
                    rows,
                    fetched_at: Utc::now(),
                }));
                PollOutcome::Ok
            }
            Err(e) => {
                // Keep the previous rows
                warn!(reason, error = %e, "Plan fetch failed");
                PollOutcome::Error
            }
        }
    }
}

/// Keeps the ranked plan fresh.
///
/// Polls at the mode-dependent cadence and also refreshes whenever the
/// revision hint changes.
pub struct PlanMonitor {
    rows_rx: watch::Receiver<Option<PlanSnapshot>>,
    poller: Option<Poller>,
    listener: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl PlanMonitor {
    pub fn spawn<P>(
        source: Arc<P>,
        hints: &dyn RevisionHintStore,
        mode_rx: watch::Receiver<Option<Mode>>,
        config: PlanMonitorConfig,
        parent: &CancellationToken,
    ) -> Self
    where
        P: PlanSource + ?Sized + 'static,
    {
        let (tx, rows_rx) = watch::channel(None);
        let refresher = Arc::new(Refresher {
            source,
            top: config.top,
            min_gap: config.min_gap,
            last_started: Mutex::new(None),
            tx,
        });
        let cancel = parent.child_token();

        let ticker = Arc::clone(&refresher);
        let poller = Poller::spawn(config.poller, mode_rx, &cancel, move || {
            let refresher = Arc::clone(&ticker);
            async move { refresher.refresh("timer").await }
        });

        let listener = tokio::spawn(listen_for_hints(
            refresher,
            hints.subscribe(),
            cancel.clone(),
            config.poller.concern,
        ));

        Self {
            rows_rx,
            poller: Some(poller),
            listener: Some(listener),
            cancel,
        }
    }

    /// Latest rows, `None` until the first successful refresh.
    pub fn snapshot(&self) -> Option<PlanSnapshot> {
        self.rows_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PlanSnapshot>> {
        self.rows_rx.clone()
    }

    /// Cancel both tasks and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
        if let Some(listener) = self.listener.take() {
            let _ = listener.await;
        }
    }
}

impl Drop for PlanMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn listen_for_hints<P: PlanSource + ?Sized>(
    refresher: Arc<Refresher<P>>,
    mut hints: broadcast::Receiver<copilot_core::RevisionHint>,
    cancel: CancellationToken,
    concern: PollConcern,
) {
    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            received = hints.recv() => received,
        };

        match received {
            Ok(hint) => info!(hint = %hint, "Revision hint changed, refreshing plan"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Hint notifications lagged, refreshing plan");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            outcome = refresher.refresh("hint") => Metrics::poll(concern.as_str(), outcome.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::MemoryHintStore;
    use async_trait::async_trait;
    use copilot_client::ClientResult;
    use copilot_core::RevisionHint;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPlan {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PlanSource for CountingPlan {
        async fn fetch_plan_rows(&self, top: u32) -> ClientResult<Vec<PlanRow>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..top.min(2))
                .map(|i| PlanRow::new(json!({ "symbol": format!("SYM{n}_{i}") })))
                .collect())
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hint_change_triggers_refresh() {
        let source = Arc::new(CountingPlan {
            calls: AtomicUsize::new(0),
        });
        let hints = MemoryHintStore::new();
        let (_mode_tx, mode_rx) = watch::channel(Some(Mode::Live));
        let root = CancellationToken::new();

        let monitor = PlanMonitor::spawn(
            Arc::clone(&source),
            &hints,
            mode_rx,
            PlanMonitorConfig::new(10),
            &root,
        );
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let first = monitor.snapshot().unwrap();
        assert_eq!(first.rows[0].symbol(), Some("SYM0_0"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        hints.set(RevisionHint::new(11)).unwrap();
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.snapshot().unwrap().rows[0].symbol(), Some("SYM1_0"));

        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_within_min_gap_are_skipped() {
        let source = Arc::new(CountingPlan {
            calls: AtomicUsize::new(0),
        });
        let hints = MemoryHintStore::new();
        let (_mode_tx, mode_rx) = watch::channel(Some(Mode::Live));
        let root = CancellationToken::new();

        let monitor = PlanMonitor::spawn(
            Arc::clone(&source),
            &hints,
            mode_rx,
            PlanMonitorConfig::new(10),
            &root,
        );
        settle().await;

        // Immediately after the first refresh
        hints.set(RevisionHint::new(1)).unwrap();
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_change_refreshes_plan() {
        let source = Arc::new(CountingPlan {
            calls: AtomicUsize::new(0),
        });
        let hints = MemoryHintStore::new();
        let (mode_tx, mode_rx) = watch::channel(Some(Mode::Waiting));
        let root = CancellationToken::new();

        let monitor = PlanMonitor::spawn(
            Arc::clone(&source),
            &hints,
            mode_rx,
            PlanMonitorConfig::new(5),
            &root,
        );
        settle().await;

        tokio::time::sleep(Duration::from_secs(3)).await;
        mode_tx.send(Some(Mode::Live)).unwrap();
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // LIVE plan cadence is 8s
        tokio::time::sleep(Duration::from_millis(8_100)).await;
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        root.cancel();
        monitor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timer_and_listener() {
        let source = Arc::new(CountingPlan {
            calls: AtomicUsize::new(0),
        });
        let hints = MemoryHintStore::new();
        let (_mode_tx, mode_rx) = watch::channel(Some(Mode::Live));
        let root = CancellationToken::new();

        let monitor = PlanMonitor::spawn(
            Arc::clone(&source),
            &hints,
            mode_rx,
            PlanMonitorConfig::new(10),
            &root,
        );
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        monitor.shutdown().await;
        assert!(!root.is_cancelled());

        tokio::time::sleep(Duration::from_secs(20)).await;
        hints.set(RevisionHint::new(2)).unwrap();
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let source = Arc::new(CountingPlan {
            calls: AtomicUsize::new(0),
        });
        let hints = MemoryHintStore::new();
        let (_mode_tx, mode_rx) = watch::channel(Some(Mode::Live));
        let root = CancellationToken::new();

        let monitor = PlanMonitor::spawn(
            Arc::clone(&source),
            &hints,
            mode_rx,
            PlanMonitorConfig::new(10),
            &root,
        );
        settle().await;
        drop(monitor);

        tokio::time::sleep(Duration::from_secs(20)).await;
        hints.set(RevisionHint::new(3)).unwrap();
        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
