//! Core domain types for the Intraday Co-Pilot client.
//!
//! This crate provides the shapes every consumer depends on:
//! - `Mode`: derived LIVE / WAITING / HISTORICAL trading state
//! - `Session`: normalized session state built from the v2 or v1 schema
//! - `PlanRow`: ranked trading candidate, passed through as received
//! - `PolicyDocument`: open-ended policy tree with typed accessors
//! - `PollCadence`: mode-dependent polling intervals

pub mod cadence;
pub mod error;
pub mod mode;
pub mod plan;
pub mod policy;
pub mod revision;
pub mod session;
pub mod universe;

pub use cadence::{PollCadence, PollConcern};
pub use error::{CoreError, Result};
pub use mode::{derive_mode, Mode, WindowStatus};
pub use plan::{PlanRow, Readiness, Regime, Side};
pub use policy::{
    parse_list, parse_path, BracketSettings, EntryWindow, PolicyDocument, PolicySnapshot, TimeFilter,
    TimeFilterKind, UniverseMode, UniverseSettings, WeightKey,
};
pub use revision::{RevisionHint, POLICY_REV_HINT_KEY};
pub use session::{stale_count_from_age, Session, SessionV1, SessionV2, STALE_P95_AGE_THRESHOLD_S};
pub use universe::{parse_pinned, UniverseConfig};
