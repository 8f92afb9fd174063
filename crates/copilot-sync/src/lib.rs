//! Client-side synchronization for the Co-Pilot.
//!
//! - `Poller`: one mode-aware timer per consumer and concern
//! - `SessionMonitor`: session polling, mode feed, revision-change hints
//! - `PlanMonitor`: plan polling plus hint-triggered refreshes
//! - `PolicyEditor`: load / edit / save with hint propagation
//! - `RevisionHintStore`: shared last-write-wins hint slot
//! - `Debouncer`: superseding delayed lookups
//! - `MetricHints`: debounced metric explanations

pub mod debounce;
pub mod error;
pub mod hint;
pub mod metric_hint;
pub mod plan_monitor;
pub mod policy_editor;
pub mod poller;
pub mod session_monitor;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use error::{SyncError, SyncResult};
pub use hint::{FileHintStore, MemoryHintStore, RevisionHintStore, DEFAULT_WATCH_INTERVAL};
pub use metric_hint::{MetricHint, MetricHints};
pub use plan_monitor::{PlanMonitor, PlanMonitorConfig, PlanSnapshot, DEFAULT_MIN_REFRESH_GAP};
pub use policy_editor::{save_default_time_filter, PolicyEditor};
pub use poller::{PollOutcome, Poller, PollerConfig};
pub use session_monitor::{RevisionTracker, SessionMonitor};
