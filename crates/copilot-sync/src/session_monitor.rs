//! Session polling and revision-change detection.

use copilot_client::SessionSource;
use copilot_core::{Mode, PollConcern, RevisionHint, Session};
use copilot_telemetry::Metrics;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::hint::RevisionHintStore;
use crate::poller::{PollOutcome, Poller, PollerConfig};

/// Decides when a polled session revision should become a hint.
///
/// The first observation is only a baseline. After that every change from
/// the last observed revision produces a hint, including a drop after a
/// backend restart. Rev 0 comes from the v1 fallback, which carries no
/// revision, so it is neither hinted nor recorded.
#[derive(Debug, Default, Clone)]
pub struct RevisionTracker {
    last_observed: Option<u64>,
}

impl RevisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, rev: u64) -> Option<RevisionHint> {
        if rev == 0 {
            return None;
        }
        let last = self.last_observed.replace(rev)?;
        (rev != last).then(|| RevisionHint::from(rev))
    }
}

/// Polls the session and publishes it with the derived mode.
pub struct SessionMonitor {
    session_rx: watch::Receiver<Option<Session>>,
    mode_rx: watch::Receiver<Option<Mode>>,
    poller: Poller,
}

impl SessionMonitor {
    /// Start polling. The session cadence follows the mode it observes.
    pub fn spawn<S>(
        source: Arc<S>,
        hints: Arc<dyn RevisionHintStore>,
        config: PollerConfig,
        parent: &CancellationToken,
    ) -> Self
    where
        S: SessionSource + ?Sized + 'static,
    {
        let (session_tx, session_rx) = watch::channel(None);
        let (mode_tx, mode_rx) = watch::channel(None);
        let session_tx = Arc::new(session_tx);
        let mode_tx = Arc::new(mode_tx);
        let tracker = Arc::new(parking_lot::Mutex::new(RevisionTracker::new()));

        let poller = Poller::spawn(config, mode_rx.clone(), parent, move || {
            let source = Arc::clone(&source);
            let hints = Arc::clone(&hints);
            let session_tx = Arc::clone(&session_tx);
            let mode_tx = Arc::clone(&mode_tx);
            let tracker = Arc::clone(&tracker);
            async move {
                match source.fetch_session().await {
                    Ok(session) => {
                        publish(&session, &tracker, hints.as_ref(), &mode_tx);
                        session_tx.send_replace(Some(session));
                        PollOutcome::Ok
                    }
                    Err(e) => {
                        // Keep the previous session
                        warn!(error = %e, "Session fetch failed");
                        PollOutcome::Error
                    }
                }
            }
        });

        Self {
            session_rx,
            mode_rx,
            poller,
        }
    }

    /// Monitor with the default session cadence.
    pub fn spawn_default<S>(
        source: Arc<S>,
        hints: Arc<dyn RevisionHintStore>,
        parent: &CancellationToken,
    ) -> Self
    where
        S: SessionSource + ?Sized + 'static,
    {
        Self::spawn(source, hints, PollerConfig::new(PollConcern::Session), parent)
    }

    /// Latest session, `None` until the first successful poll.
    pub fn session(&self) -> Option<Session> {
        self.session_rx.borrow().clone()
    }

    pub fn mode(&self) -> Option<Mode> {
        *self.mode_rx.borrow()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<Option<Session>> {
        self.session_rx.clone()
    }

    /// Mode feed for other pollers. Only changes notify.
    pub fn subscribe_mode(&self) -> watch::Receiver<Option<Mode>> {
        self.mode_rx.clone()
    }

    pub async fn shutdown(self) {
        self.poller.shutdown().await;
    }
}

fn publish(
    session: &Session,
    tracker: &parking_lot::Mutex<RevisionTracker>,
    hints: &dyn RevisionHintStore,
    mode_tx: &watch::Sender<Option<Mode>>,
) {
    Metrics::session_rev(session.rev);

    let changed = mode_tx.send_if_modified(|current| {
        if *current == Some(session.mode) {
            return false;
        }
        *current = Some(session.mode);
        true
    });
    if changed {
        info!(mode = %session.mode, rev = session.rev, "Mode changed");
        Metrics::mode_set(session.mode);
    }

    let hint = tracker.lock().observe(session.rev);
    if let Some(hint) = hint {
        match hints.set(hint) {
            Ok(()) => {
                debug!(hint = %hint, "Session revision changed, hint written");
                Metrics::hint_written("session");
            }
            Err(e) => warn!(error = %e, "Failed to write revision hint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_baseline() {
        let mut tracker = RevisionTracker::new();
        assert_eq!(tracker.observe(4), None);
        assert_eq!(tracker.observe(4), None);
    }

    #[test]
    fn test_increasing_revs_write_on_change_only() {
        let mut tracker = RevisionTracker::new();
        let written: Vec<_> = [1, 1, 2, 2, 2, 5, 6, 6]
            .into_iter()
            .filter_map(|rev| tracker.observe(rev))
            .collect();
        assert_eq!(
            written,
            vec![RevisionHint::new(2), RevisionHint::new(5), RevisionHint::new(6)]
        );
    }

    #[test]
    fn test_v1_fallback_rev_is_ignored() {
        let mut tracker = RevisionTracker::new();
        assert_eq!(tracker.observe(7), None);
        assert_eq!(tracker.observe(8), Some(RevisionHint::new(8)));
        // v1 fallback reports rev 0, then v2 comes back
        assert_eq!(tracker.observe(0), None);
        assert_eq!(tracker.observe(8), None);
        assert_eq!(tracker.observe(9), Some(RevisionHint::new(9)));
    }

    #[test]
    fn test_v1_before_first_v2_is_not_baseline() {
        let mut tracker = RevisionTracker::new();
        assert_eq!(tracker.observe(0), None);
        assert_eq!(tracker.observe(12), None);
        assert_eq!(tracker.observe(13), Some(RevisionHint::new(13)));
    }

    #[test]
    fn test_backend_restart_keeps_hinting() {
        let mut tracker = RevisionTracker::new();
        let written: Vec<_> = [500, 501, 1, 2, 2, 3]
            .into_iter()
            .filter_map(|rev| tracker.observe(rev))
            .collect();
        assert_eq!(
            written,
            vec![
                RevisionHint::new(501),
                RevisionHint::new(1),
                RevisionHint::new(2),
                RevisionHint::new(3),
            ]
        );
    }
}
