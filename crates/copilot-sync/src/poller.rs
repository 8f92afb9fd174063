//! Mode-aware periodic task.
//!
//! One poller owns one timer. The first tick fires immediately; later ticks
//! wait `cadence.interval_for(mode)`. A mode change restarts the timer with
//! the new period. Cancelling stops the loop and drops any in-flight tick.

use copilot_core::{Mode, PollCadence, PollConcern};
use copilot_telemetry::Metrics;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Result of one tick, for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ok,
    Error,
    /// Tick decided not to fetch (e.g. too soon after the previous one).
    Skipped,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// Poller settings.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub concern: PollConcern,
    pub cadence: PollCadence,
    /// Tick immediately when the mode changes instead of only restarting
    /// the timer.
    pub tick_on_mode_change: bool,
}

impl PollerConfig {
    /// Default cadence for `concern`, timer restart only on mode change.
    pub fn new(concern: PollConcern) -> Self {
        Self {
            concern,
            cadence: concern.default_cadence(),
            tick_on_mode_change: false,
        }
    }

    pub fn with_cadence(mut self, cadence: PollCadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn tick_on_mode_change(mut self, enabled: bool) -> Self {
        self.tick_on_mode_change = enabled;
        self
    }
}

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct Poller {
    concern: PollConcern,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn the loop.
    ///
    /// `parent` cancellation stops this poller too; cancelling or dropping
    /// the poller leaves `parent` untouched.
    pub fn spawn<F, Fut>(
        config: PollerConfig,
        mut mode_rx: watch::Receiver<Option<Mode>>,
        parent: &CancellationToken,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = PollOutcome> + Send + 'static,
    {
        let cancel = parent.child_token();
        let token = cancel.clone();
        let concern = config.concern.as_str();

        let handle = tokio::spawn(async move {
            debug!(concern, "Poller started");
            let mut fire = true;

            loop {
                if fire {
                    tokio::select! {
                        biased;
                        () = token.cancelled() => {
                            Metrics::poll(concern, "discarded");
                            break;
                        }
                        outcome = tick() => {
                            trace!(concern, outcome = outcome.as_str(), "Poll tick");
                            Metrics::poll(concern, outcome.as_str());
                        }
                    }
                }

                let mode = *mode_rx.borrow_and_update();
                let interval = config.cadence.interval_for(mode);

                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    changed = mode_rx.changed() => {
                        if changed.is_err() {
                            // Mode source is gone; keep polling on the last period
                            trace!(concern, "Mode channel closed");
                            tokio::select! {
                                biased;
                                () = token.cancelled() => break,
                                () = tokio::time::sleep(interval) => fire = true,
                            }
                            continue;
                        }
                        let new_mode = *mode_rx.borrow();
                        debug!(concern, ?new_mode, "Mode changed, restarting timer");
                        fire = config.tick_on_mode_change;
                    }
                    () = tokio::time::sleep(interval) => fire = true,
                }
            }

            debug!(concern, "Poller stopped");
        });

        Self {
            concern: config.concern,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn concern(&self) -> PollConcern {
        self.concern
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
