//! Ingest-time deduplication.
//!
//! An incoming alert is a duplicate when an alert with the same
//! `(component, type, message)` was created within the configured window.
//! Duplicates are dropped, not merged; counting repeats is the aggregator's
//! read-side job.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::Duration;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::clock::Clock;
use crate::config::DedupConfig;
use crate::error::Result;
use crate::store::AlertStore;
use crate::types::AlertFilter;

/// Decides whether an incoming alert repeats a recent one.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    config: DedupConfig,
    store: Arc<dyn AlertStore>,
    clock: Arc<dyn Clock>,
}

impl Deduplicator {
    /// Creates a deduplicator over `store`.
    #[must_use]
    pub fn new(config: DedupConfig, store: Arc<dyn AlertStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Checks the configured window.
    ///
    /// Always `false` when deduplication is disabled.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn is_duplicate(&self, component: &str, alert_type: &str, message: &str) -> Result<bool> {
        self.is_duplicate_within(component, alert_type, message, self.config.window_minutes)
    }

    /// Checks an explicit window in minutes.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn is_duplicate_within(
        &self,
        component: &str,
        alert_type: &str,
        message: &str,
        window_minutes: u32,
    ) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }

        let since = self.clock.ago(Duration::minutes(i64::from(window_minutes)));
        let filter = AlertFilter::new()
            .component(component)
            .alert_type(alert_type)
            .message(message)
            .created_after(since);

        let duplicate = !self.store.find(&filter, Some(1))?.is_empty();
        if duplicate {
            debug!(component, alert_type, window_minutes, "duplicate alert inside window");
        }
        Ok(duplicate)
    }
}

/// Striped locks serializing check-then-create per alert identity.
///
/// Two producers reporting the same `(component, type, message)` at once
/// hash to the same stripe, so only one of them can observe "not a
/// duplicate" and insert.
#[derive(Debug)]
pub struct IngestLocks {
    stripes: Box<[Mutex<()>]>,
}

impl IngestLocks {
    /// Default number of stripes.
    pub const DEFAULT_STRIPES: usize = 64;

    /// Creates a lock table with [`Self::DEFAULT_STRIPES`] stripes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stripes(Self::DEFAULT_STRIPES)
    }

    /// Creates a lock table with `count` stripes (at least one).
    #[must_use]
    pub fn with_stripes(count: usize) -> Self {
        let stripes = (0..count.max(1)).map(|_| Mutex::new(())).collect();
        Self { stripes }
    }

    /// Locks the stripe owning this alert identity.
    pub fn lock(&self, component: &str, alert_type: &str, message: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe(component, alert_type, message)].lock()
    }

    fn stripe(&self, component: &str, alert_type: &str, message: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        component.hash(&mut hasher);
        alert_type.hash(&mut hasher);
        message.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }
}

impl Default for IngestLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryAlertStore;
    use crate::types::{NewAlert, Severity};

    fn setup(config: DedupConfig) -> (Deduplicator, Arc<MemoryAlertStore>, ManualClock) {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryAlertStore::with_clock(Arc::new(clock.clone())));
        let dedup = Deduplicator::new(config, store.clone(), Arc::new(clock.clone()));
        (dedup, store, clock)
    }

    fn seed(store: &MemoryAlertStore) {
        store
            .create(NewAlert::new("INGESTION", Severity::Critical, "system_down", "db down").unwrap())
            .unwrap();
    }

    #[test]
    fn identical_alert_inside_window_is_duplicate() {
        let (dedup, store, clock) = setup(DedupConfig::default());
        seed(&store);
        clock.advance_minutes(59);
        assert!(dedup.is_duplicate("INGESTION", "system_down", "db down").unwrap());
    }

    #[test]
    fn identical_alert_after_window_is_not_duplicate() {
        let (dedup, store, clock) = setup(DedupConfig::default());
        seed(&store);
        clock.advance_minutes(61);
        assert!(!dedup.is_duplicate("INGESTION", "system_down", "db down").unwrap());
    }

    #[test]
    fn any_field_difference_is_not_duplicate() {
        let (dedup, store, _) = setup(DedupConfig::default());
        seed(&store);
        assert!(!dedup.is_duplicate("API", "system_down", "db down").unwrap());
        assert!(!dedup.is_duplicate("INGESTION", "latency", "db down").unwrap());
        assert!(!dedup.is_duplicate("INGESTION", "system_down", "db up").unwrap());
    }

    #[test]
    fn explicit_window_overrides_config() {
        let (dedup, store, clock) = setup(DedupConfig::default());
        seed(&store);
        clock.advance_minutes(10);
        assert!(!dedup.is_duplicate_within("INGESTION", "system_down", "db down", 5).unwrap());
        assert!(dedup.is_duplicate_within("INGESTION", "system_down", "db down", 15).unwrap());
    }

    #[test]
    fn disabled_never_reports_duplicates() {
        let (dedup, store, _) = setup(DedupConfig {
            enabled: false,
            ..Default::default()
        });
        seed(&store);
        assert!(!dedup.is_duplicate("INGESTION", "system_down", "db down").unwrap());
    }

    #[test]
    fn same_identity_maps_to_same_stripe() {
        let locks = IngestLocks::with_stripes(8);
        let a = locks.stripe("INGESTION", "system_down", "db down");
        let b = locks.stripe("INGESTION", "system_down", "db down");
        assert_eq!(a, b);
        assert!(a < 8);
    }

    #[test]
    fn zero_stripes_is_clamped() {
        let locks = IngestLocks::with_stripes(0);
        let _guard = locks.lock("a", "b", "c");
    }
}
