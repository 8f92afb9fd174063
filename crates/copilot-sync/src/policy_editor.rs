//! Policy editing session.
//!
//! Holds the last loaded snapshot plus a working copy. Edits are
//! copy-on-write so a rejected edit leaves the working copy untouched, and
//! every save writes the revision hint so plan consumers re-fetch.

use copilot_client::PolicySource;
use copilot_core::{
    parse_path, PolicyDocument, PolicySnapshot, RevisionHint, TimeFilter, UniverseMode, WeightKey,
};
use copilot_telemetry::Metrics;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::hint::RevisionHintStore;

/// Write the hint for a completed save. Failures are logged, not returned;
/// the save itself already succeeded.
fn write_save_hint(hints: &dyn RevisionHintStore, saved: &PolicySnapshot) {
    let hint = RevisionHint::from_rev_or_now(saved.rev);
    match hints.set(hint) {
        Ok(()) => Metrics::hint_written("policy_save"),
        Err(e) => warn!(error = %e, "Failed to write revision hint after save"),
    }
}

/// Load the current policy, set `time_filters.default`, and save.
///
/// Works on a fresh copy from the backend, independent of any editor's
/// working copy.
pub async fn save_default_time_filter<S>(
    source: &S,
    hints: &dyn RevisionHintStore,
    filter: &TimeFilter,
) -> SyncResult<PolicySnapshot>
where
    S: PolicySource + ?Sized,
{
    let current = source.load_policy().await?;
    let mut body = current.body;
    body.set_default_time_filter(filter)?;

    let saved = source.save_policy(&body).await?;
    write_save_hint(hints, &saved);
    info!(kind = ?filter.kind, start = %filter.start, end = %filter.end, rev = ?saved.rev, "Default time filter saved");
    Ok(saved)
}

pub struct PolicyEditor<S: ?Sized> {
    source: Arc<S>,
    hints: Arc<dyn RevisionHintStore>,
    loaded: Option<PolicySnapshot>,
    working: PolicyDocument,
    dirty: bool,
}

impl<S> PolicyEditor<S>
where
    S: PolicySource + ?Sized,
{
    pub fn new(source: Arc<S>, hints: Arc<dyn RevisionHintStore>) -> Self {
        Self {
            source,
            hints,
            loaded: None,
            working: PolicyDocument::new(),
            dirty: false,
        }
    }

    /// Fetch the policy, discarding unsaved edits.
    pub async fn load(&mut self) -> SyncResult<&PolicySnapshot> {
        let snapshot = self.source.load_policy().await?;
        info!(rev = ?snapshot.rev, keys = snapshot.body.as_map().len(), "Policy loaded");
        self.working = snapshot.body.clone();
        self.dirty = false;
        Ok(self.loaded.insert(snapshot))
    }

    /// Last snapshot from the backend.
    pub fn loaded(&self) -> Option<&PolicySnapshot> {
        self.loaded.as_ref()
    }

    pub fn document(&self) -> &PolicyDocument {
        &self.working
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply `edit` to a copy of the working document; keep it only if the
    /// edit succeeds.
    pub fn edit<F>(&mut self, edit: F) -> SyncResult<()>
    where
        F: FnOnce(&mut PolicyDocument) -> copilot_core::Result<()>,
    {
        if self.loaded.is_none() {
            return Err(SyncError::NotLoaded);
        }
        let mut next = self.working.clone();
        edit(&mut next)?;
        if next != self.working {
            self.working = next;
            self.dirty = true;
        }
        Ok(())
    }

    /// Set the value at a dotted path, e.g. `universe.min_price`.
    pub fn update(&mut self, dotted: &str, value: Value) -> SyncResult<()> {
        let path = parse_path(dotted)?;
        self.edit(|doc| doc.set_path(&path, value))
    }

    pub fn set_weight(&mut self, key: WeightKey, value: f64) -> SyncResult<()> {
        self.edit(|doc| doc.set_weight(key, value))
    }

    pub fn set_universe_mode(&mut self, mode: UniverseMode) -> SyncResult<()> {
        self.edit(|doc| doc.set_universe_mode(mode))
    }

    /// Replace thresholds from JSON text. Invalid JSON is rejected.
    pub fn set_thresholds_json(&mut self, text: &str) -> SyncResult<()> {
        self.edit(|doc| doc.set_thresholds_json(text))
    }

    /// Save the working copy. The server echo becomes the new working copy.
    pub async fn save(&mut self) -> SyncResult<&PolicySnapshot> {
        if self.loaded.is_none() {
            return Err(SyncError::NotLoaded);
        }

        let saved = self.source.save_policy(&self.working).await?;
        write_save_hint(self.hints.as_ref(), &saved);
        info!(rev = ?saved.rev, "Policy saved");

        self.working = saved.body.clone();
        self.dirty = false;
        Ok(self.loaded.insert(saved))
    }

    /// Save a default time filter against a fresh copy of the policy.
    ///
    /// A clean editor adopts the result; unsaved edits are left alone.
    pub async fn save_default_time_filter(&mut self, filter: &TimeFilter) -> SyncResult<PolicySnapshot> {
        let saved =
            save_default_time_filter(self.source.as_ref(), self.hints.as_ref(), filter).await?;
        if !self.dirty {
            self.working = saved.body.clone();
            self.loaded = Some(saved.clone());
        }
        Ok(saved)
    }
}
