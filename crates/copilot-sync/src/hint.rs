//! Revision hint stores.
//!
//! A single last-write-wins slot shared by independent consumers. Writers are
//! the session monitor and the policy save path; readers only treat a change
//! as a reason to re-fetch.

use copilot_core::{RevisionHint, POLICY_REV_HINT_KEY};
use copilot_telemetry::Metrics;
use parking_lot::RwLock;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncResult;

const NOTIFY_CAPACITY: usize = 16;

/// Default interval for re-reading the hint file.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Shared revision hint slot.
pub trait RevisionHintStore: Send + Sync {
    fn get(&self) -> Option<RevisionHint>;

    /// Store `hint`. Subscribers are notified when the value changes.
    fn set(&self, hint: RevisionHint) -> SyncResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<RevisionHint>;
}

impl<T: RevisionHintStore + ?Sized> RevisionHintStore for Arc<T> {
    fn get(&self) -> Option<RevisionHint> {
        (**self).get()
    }

    fn set(&self, hint: RevisionHint) -> SyncResult<()> {
        (**self).set(hint)
    }

    fn subscribe(&self) -> broadcast::Receiver<RevisionHint> {
        (**self).subscribe()
    }
}

/// Process-local hint store.
pub struct MemoryHintStore {
    value: RwLock<Option<RevisionHint>>,
    tx: broadcast::Sender<RevisionHint>,
}

impl MemoryHintStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            value: RwLock::new(None),
            tx,
        }
    }

    /// Replace the value, notifying when it changed. Returns whether it changed.
    fn replace(&self, hint: RevisionHint) -> bool {
        {
            let mut value = self.value.write();
            if *value == Some(hint) {
                return false;
            }
            *value = Some(hint);
        }
        // No receivers is fine
        let _ = self.tx.send(hint);
        true
    }
}

impl Default for MemoryHintStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionHintStore for MemoryHintStore {
    fn get(&self) -> Option<RevisionHint> {
        *self.value.read()
    }

    fn set(&self, hint: RevisionHint) -> SyncResult<()> {
        self.replace(hint);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RevisionHint> {
        self.tx.subscribe()
    }
}

/// Hint store persisted to `<data_dir>/policy_rev_hint`.
///
/// Other processes sharing the data directory see each other's writes once
/// the watcher task re-reads the file.
pub struct FileHintStore {
    dir: PathBuf,
    path: PathBuf,
    inner: MemoryHintStore,
}

impl FileHintStore {
    /// Open the store, creating `data_dir` if needed and loading any
    /// existing value.
    pub fn open(data_dir: impl AsRef<Path>) -> SyncResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let store = Self {
            dir: data_dir.to_path_buf(),
            path: data_dir.join(POLICY_REV_HINT_KEY),
            inner: MemoryHintStore::new(),
        };
        if let Some(hint) = store.read_file()? {
            *store.inner.value.write() = Some(hint);
        }

        info!(path = %store.path.display(), hint = ?store.get(), "Hint store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> SyncResult<Option<RevisionHint>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match raw.parse::<RevisionHint>() {
            Ok(hint) => Ok(Some(hint)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unparseable hint file");
                Ok(None)
            }
        }
    }

    /// Re-read the file and notify subscribers of an external change.
    ///
    /// Returns `true` when the file held a new value.
    pub fn reload(&self) -> SyncResult<bool> {
        let Some(hint) = self.read_file()? else {
            return Ok(false);
        };
        let changed = self.inner.replace(hint);
        if changed {
            debug!(hint = %hint, "External hint write observed");
            Metrics::hint_written("external");
        }
        Ok(changed)
    }

    /// Spawn the task that polls the file for writes from other processes.
    pub fn spawn_watcher(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Hint watcher stopped");
                        return;
                    }
                    () = tokio::time::sleep(interval) => {}
                }
                if let Err(e) = store.reload() {
                    warn!(error = %e, "Hint file reload failed");
                }
            }
        })
    }
}

impl RevisionHintStore for FileHintStore {
    fn get(&self) -> Option<RevisionHint> {
        self.inner.get()
    }

    fn set(&self, hint: RevisionHint) -> SyncResult<()> {
        // Unique temp file per writer, renamed into place
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(hint.to_string().as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        self.inner.replace(hint);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RevisionHint> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_notifies_on_change_only() {
        let store = MemoryHintStore::new();
        let mut rx = store.subscribe();
        assert_eq!(store.get(), None);

        store.set(RevisionHint::new(5)).unwrap();
        assert_eq!(rx.recv().await.unwrap(), RevisionHint::new(5));

        store.set(RevisionHint::new(5)).unwrap();
        assert!(rx.try_recv().is_err());

        store.set(RevisionHint::new(3)).unwrap();
        assert_eq!(rx.recv().await.unwrap(), RevisionHint::new(3));
        assert_eq!(store.get(), Some(RevisionHint::new(3)));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileHintStore::open(dir.path()).unwrap();
            store.set(RevisionHint::new(1_760_000_000_000)).unwrap();
        }

        let reopened = FileHintStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(), Some(RevisionHint::new(1_760_000_000_000)));
        let raw = std::fs::read_to_string(dir.path().join("policy_rev_hint")).unwrap();
        assert_eq!(raw, "1760000000000");
    }

    #[test]
    fn test_file_store_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("policy_rev_hint"), "not-a-number").unwrap();

        let store = FileHintStore::open(dir.path()).unwrap();
        assert_eq!(store.get(), None);
        assert!(!store.reload().unwrap());
    }

    #[test]
    fn test_concurrent_writers_leave_one_valid_value() {
        let dir = tempfile::tempdir().unwrap();
        let stores: Vec<_> = (0..4)
            .map(|_| Arc::new(FileHintStore::open(dir.path()).unwrap()))
            .collect();

        let writers: Vec<_> = stores
            .iter()
            .enumerate()
            .map(|(i, store)| {
                let store = Arc::clone(store);
                std::thread::spawn(move || {
                    for n in 0..50 {
                        store.set(RevisionHint::new((i * 1_000 + n) as i64)).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join("policy_rev_hint")).unwrap();
        let last: i64 = raw.parse().unwrap();
        assert_eq!(last % 1_000, 49);
        // Only the hint file remains, no stray temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_reload_notifies_external_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHintStore::open(dir.path()).unwrap();
        let mut rx = store.subscribe();

        // Another process writes the file
        std::fs::write(dir.path().join("policy_rev_hint"), "42\n").unwrap();
        assert!(store.reload().unwrap());
        assert_eq!(rx.recv().await.unwrap(), RevisionHint::new(42));

        // Same value again is not a change
        assert!(!store.reload().unwrap());
    }
}
