//! File-backed alert storage.
//!
//! [`JsonFileAlertStore`] keeps alerts in a JSON snapshot file that several
//! processes may share. Every operation takes the file's advisory lock and
//! reloads the snapshot into a [`MemoryAlertStore`] before running. Mutations
//! hold the lock exclusively across load, compare-and-set and write, so a
//! status change made by another process is never overwritten. Snapshots are
//! written to a temporary sibling file and renamed into place, so a crash
//! mid-write leaves the previous snapshot intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::persist::LockedFile;
use crate::store::{AlertStore, MemoryAlertStore};
use crate::types::{Alert, AlertFilter, AlertId, AlertStatus, EscalationLevel, NewAlert};

/// Alert store persisted as a JSON snapshot file.
#[derive(Debug)]
pub struct JsonFileAlertStore {
    file: LockedFile,
    inner: MemoryAlertStore,
}

impl JsonFileAlertStore {
    /// Opens the store at `path`, loading any existing snapshot.
    ///
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the file exists but cannot be
    /// read, and `AlertError::SerializationError` if it is corrupt.
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Self {
            file: LockedFile::new(path),
            inner: MemoryAlertStore::with_clock(clock),
        };
        store.read(|_| Ok(()))?;
        debug!(path = %store.path().display(), count = store.len(), "loaded alerts from disk");
        Ok(store)
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Returns the number of alerts seen by the most recent operation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the most recent operation saw no alerts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn load(&self, raw: Option<&str>) -> Result<()> {
        let alerts: Vec<Alert> = match raw {
            Some(raw) => serde_json::from_str(raw)?,
            None => Vec::new(),
        };
        self.inner.replace_all(alerts);
        Ok(())
    }

    fn read<T>(&self, op: impl FnOnce(&MemoryAlertStore) -> Result<T>) -> Result<T> {
        self.file.read(|raw| {
            self.load(raw)?;
            op(&self.inner)
        })
    }

    /// Runs `op` against fresh state; `op` reports whether it changed anything.
    fn mutate<T>(&self, op: impl FnOnce(&MemoryAlertStore) -> Result<(T, bool)>) -> Result<T> {
        self.file.update(|raw| {
            self.load(raw)?;
            let (value, changed) = op(&self.inner)?;
            let bytes = if changed {
                Some(serde_json::to_vec_pretty(&self.inner.snapshot())?)
            } else {
                None
            };
            Ok((value, bytes))
        })
    }
}

impl AlertStore for JsonFileAlertStore {
    fn create(&self, new: NewAlert) -> Result<Alert> {
        self.mutate(|inner| Ok((inner.create(new)?, true)))
    }

    fn get(&self, id: AlertId) -> Result<Option<Alert>> {
        self.read(|inner| inner.get(id))
    }

    fn update_status(&self, id: AlertId, next: AlertStatus, actor: &str) -> Result<bool> {
        self.mutate(|inner| {
            let changed = inner.update_status(id, next, actor)?;
            Ok((changed, changed))
        })
    }

    fn merge_metadata(
        &self,
        id: AlertId,
        entries: BTreeMap<String, serde_json::Value>,
    ) -> Result<bool> {
        self.mutate(|inner| {
            let changed = inner.merge_metadata(id, entries)?;
            Ok((changed, changed))
        })
    }

    fn record_escalation(
        &self,
        id: AlertId,
        expected: EscalationLevel,
        next: EscalationLevel,
        recipients: &[String],
    ) -> Result<bool> {
        self.mutate(|inner| {
            let changed = inner.record_escalation(id, expected, next, recipients)?;
            Ok((changed, changed))
        })
    }

    fn find(&self, filter: &AlertFilter, limit: Option<usize>) -> Result<Vec<Alert>> {
        self.read(|inner| inner.find(filter, limit))
    }

    fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let deleted = self.mutate(|inner| {
            let deleted = inner.delete_resolved_before(cutoff)?;
            Ok((deleted, deleted > 0))
        })?;
        if deleted > 0 {
            info!(path = %self.path().display(), deleted, "pruned resolved alerts");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AlertError;
    use crate::types::Severity;
    use std::fs;
    use tempfile::TempDir;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::default())
    }

    fn new_alert() -> NewAlert {
        NewAlert::new("INGESTION", Severity::Critical, "system_down", "db down").unwrap()
    }

    #[test]
    fn open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileAlertStore::open(dir.path().join("alerts.json"), clock()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json");

        let id = {
            let store = JsonFileAlertStore::open(&path, clock()).unwrap();
            let alert = store.create(new_alert()).unwrap();
            assert!(store
                .update_status(alert.id, AlertStatus::Acknowledged, "alice")
                .unwrap());
            alert.id
        };

        let reopened = JsonFileAlertStore::open(&path, clock()).unwrap();
        assert_eq!(reopened.len(), 1);
        let alert = reopened.get(id).unwrap().unwrap();
        assert_eq!(alert.status, AlertStatus::Acknowledged);
    }

    #[test]
    fn snapshot_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state").join("alerts.json");
        let store = JsonFileAlertStore::open(&path, clock()).unwrap();
        store.create(new_alert()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_snapshot_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json");
        fs::write(&path, "{not json").unwrap();

        let result = JsonFileAlertStore::open(&path, clock());
        assert!(matches!(result, Err(AlertError::SerializationError(_))));
    }

    #[test]
    fn second_handle_sees_other_handles_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json");
        let daemon = JsonFileAlertStore::open(&path, clock()).unwrap();
        let cli = JsonFileAlertStore::open(&path, clock()).unwrap();

        let alert = cli.create(new_alert()).unwrap();
        assert_eq!(daemon.get(alert.id).unwrap().unwrap().status, AlertStatus::Active);

        assert!(cli
            .update_status(alert.id, AlertStatus::Acknowledged, "alice")
            .unwrap());
        assert_eq!(
            daemon.get(alert.id).unwrap().unwrap().status,
            AlertStatus::Acknowledged
        );
    }

    #[test]
    fn stale_handle_cannot_escalate_acknowledged_alert() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json");
        let daemon = JsonFileAlertStore::open(&path, clock()).unwrap();
        let alert = daemon.create(new_alert()).unwrap();

        let cli = JsonFileAlertStore::open(&path, clock()).unwrap();
        assert!(cli
            .update_status(alert.id, AlertStatus::Acknowledged, "alice")
            .unwrap());

        let level1 = EscalationLevel::new(1).unwrap();
        assert!(!daemon
            .record_escalation(alert.id, EscalationLevel::NONE, level1, &["oncall".to_string()])
            .unwrap());

        let on_disk = JsonFileAlertStore::open(&path, clock()).unwrap();
        let stored = on_disk.get(alert.id).unwrap().unwrap();
        assert_eq!(stored.status, AlertStatus::Acknowledged);
        assert_eq!(stored.escalation_level, EscalationLevel::NONE);
    }

    #[test]
    fn writes_from_two_handles_are_both_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json");
        let first = JsonFileAlertStore::open(&path, clock()).unwrap();
        let second = JsonFileAlertStore::open(&path, clock()).unwrap();

        let a = first.create(new_alert()).unwrap();
        let b = second
            .create(NewAlert::new("API", Severity::Warning, "latency", "slow").unwrap())
            .unwrap();
        assert!(first.update_status(a.id, AlertStatus::Resolved, "ops").unwrap());

        let on_disk = JsonFileAlertStore::open(&path, clock()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk.get(a.id).unwrap().unwrap().status, AlertStatus::Resolved);
        assert_eq!(on_disk.get(b.id).unwrap().unwrap().status, AlertStatus::Active);
    }

    #[test]
    fn concurrent_resolves_across_handles_only_one_wins() {
        let dir = TempDir::new().unwrap();
        let path = Arc::new(dir.path().join("alerts.json"));
        let id = JsonFileAlertStore::open(path.as_path(), clock())
            .unwrap()
            .create(new_alert())
            .unwrap()
            .id;

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let path = Arc::clone(&path);
                std::thread::spawn(move || {
                    let store = JsonFileAlertStore::open(path.as_path(), clock()).unwrap();
                    store
                        .update_status(id, AlertStatus::Resolved, &format!("user{i}"))
                        .unwrap()
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn failed_transition_does_not_rewrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.json");
        let store = JsonFileAlertStore::open(&path, clock()).unwrap();
        let alert = store.create(new_alert()).unwrap();
        store.update_status(alert.id, AlertStatus::Resolved, "ops").unwrap();

        let before = fs::read_to_string(&path).unwrap();
        assert!(!store.update_status(alert.id, AlertStatus::Resolved, "ops").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }
}
