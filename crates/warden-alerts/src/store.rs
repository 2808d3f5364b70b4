//! Alert persistence contract and the in-memory store.
//!
//! This module provides:
//! - [`AlertStore`] - the guarantees the engine requires from persistence
//! - [`MemoryAlertStore`] - thread-safe in-memory implementation
//!
//! Every mutating call is a single compare-and-set under the store's write
//! lock, so two concurrent acknowledge/resolve calls cannot both succeed and
//! an escalation write against an alert that stopped being `active` is a
//! no-op.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::types::{
    Alert, AlertFilter, AlertId, AlertStatus, EscalationLevel, META_ESCALATED_AT,
    META_ESCALATION_RECIPIENTS, NewAlert,
};

/// Persistence contract consumed by the engine.
///
/// Implementors assign `created_at` themselves. "Nothing happened" outcomes
/// (unknown id, illegal transition, lost race) are reported as `Ok(false)`;
/// `Err` is reserved for validation and connectivity failures.
pub trait AlertStore: Send + Sync + fmt::Debug {
    /// Inserts a new `active` alert and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the store cannot be reached.
    fn create(&self, new: NewAlert) -> Result<Alert>;

    /// Fetches an alert by id.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the store cannot be reached.
    fn get(&self, id: AlertId) -> Result<Option<Alert>>;

    /// Atomically moves an alert to `next` if the state machine allows it.
    ///
    /// Returns `false` if the alert does not exist or the transition is illegal.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the store cannot be reached.
    fn update_status(&self, id: AlertId, next: AlertStatus, actor: &str) -> Result<bool>;

    /// Merges keys into the alert's metadata without touching other keys.
    ///
    /// Returns `false` if the alert does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the store cannot be reached.
    fn merge_metadata(
        &self,
        id: AlertId,
        entries: BTreeMap<String, serde_json::Value>,
    ) -> Result<bool>;

    /// Atomically raises the escalation level from `expected` to `next`.
    ///
    /// Succeeds only while the alert is `active`, still at `expected`, and
    /// `next` is higher. Records `escalated_at` and `escalation_recipients`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the store cannot be reached.
    fn record_escalation(
        &self,
        id: AlertId,
        expected: EscalationLevel,
        next: EscalationLevel,
        recipients: &[String],
    ) -> Result<bool>;

    /// Returns alerts matching `filter`, newest first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the store cannot be reached.
    fn find(&self, filter: &AlertFilter, limit: Option<usize>) -> Result<Vec<Alert>>;

    /// Deletes `resolved` alerts created at or before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` if the store cannot be reached.
    fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// Thread-safe in-memory alert store.
#[derive(Debug)]
pub struct MemoryAlertStore {
    clock: Arc<dyn Clock>,
    alerts: RwLock<HashMap<AlertId, Alert>>,
}

impl MemoryAlertStore {
    /// Creates an empty store reading wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store with the given time source.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            alerts: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a store pre-populated with existing records.
    #[must_use]
    pub fn from_alerts(clock: Arc<dyn Clock>, alerts: Vec<Alert>) -> Self {
        Self {
            clock,
            alerts: RwLock::new(alerts.into_iter().map(|a| (a.id, a)).collect()),
        }
    }

    /// Replaces every record with `alerts`.
    pub fn replace_all(&self, alerts: Vec<Alert>) {
        *self.alerts.write() = alerts.into_iter().map(|a| (a.id, a)).collect();
    }

    /// Returns a copy of every record, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Alert> {
        let mut all: Vec<Alert> = self.alerts.read().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// Returns the number of stored alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryAlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertStore for MemoryAlertStore {
    fn create(&self, new: NewAlert) -> Result<Alert> {
        let alert = Alert::from_new(new, self.clock.now());
        self.alerts.write().insert(alert.id, alert.clone());
        Ok(alert)
    }

    fn get(&self, id: AlertId) -> Result<Option<Alert>> {
        Ok(self.alerts.read().get(&id).cloned())
    }

    fn update_status(&self, id: AlertId, next: AlertStatus, actor: &str) -> Result<bool> {
        let now = self.clock.now();
        let mut alerts = self.alerts.write();
        let Some(alert) = alerts.get_mut(&id) else {
            return Ok(false);
        };
        let changed = alert.transition(next, actor, now);
        if !changed {
            debug!(alert_id = %id, from = %alert.status, to = %next, "illegal status transition");
        }
        Ok(changed)
    }

    fn merge_metadata(
        &self,
        id: AlertId,
        entries: BTreeMap<String, serde_json::Value>,
    ) -> Result<bool> {
        let mut alerts = self.alerts.write();
        let Some(alert) = alerts.get_mut(&id) else {
            return Ok(false);
        };
        alert.metadata.extend(entries);
        Ok(true)
    }

    fn record_escalation(
        &self,
        id: AlertId,
        expected: EscalationLevel,
        next: EscalationLevel,
        recipients: &[String],
    ) -> Result<bool> {
        let now = self.clock.now();
        let mut alerts = self.alerts.write();
        let Some(alert) = alerts.get_mut(&id) else {
            return Ok(false);
        };
        if !alert.is_active() || alert.escalation_level != expected || next <= expected {
            return Ok(false);
        }
        alert.escalation_level = next;
        alert
            .metadata
            .insert(META_ESCALATED_AT.to_string(), now.to_rfc3339().into());
        alert.metadata.insert(
            META_ESCALATION_RECIPIENTS.to_string(),
            serde_json::Value::from(recipients.to_vec()),
        );
        Ok(true)
    }

    fn find(&self, filter: &AlertFilter, limit: Option<usize>) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read();
        let mut matched: Vec<Alert> = alerts
            .values()
            .filter(|a| a.matches(filter))
            .cloned()
            .collect();
        drop(alerts);

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut alerts = self.alerts.write();
        let before = alerts.len();
        alerts.retain(|_, a| !(a.status == AlertStatus::Resolved && a.created_at <= cutoff));
        Ok(before - alerts.len())
    }
}
