//! The orchestration surface callers use.
//!
//! [`AlertLifecycle`] wires the store, deduplicator, router, escalator,
//! aggregator and notification dispatcher together. It is cheap to clone;
//! clones share all state.

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregate::{AggregateRow, Aggregator, StatsRow};
use crate::channels::{Dispatcher, Notification, NotificationChannel};
use crate::clock::{Clock, SystemClock};
use crate::config::AlertingConfig;
use crate::dedup::{Deduplicator, IngestLocks};
use crate::error::{AlertError, Result};
use crate::escalation::{Escalator, SweepReport};
use crate::router::{Resolution, Router, RoutingRule};
use crate::store::{AlertStore, MemoryAlertStore};
use crate::types::{Alert, AlertFilter, AlertId, AlertStatus, EscalationLevel, NewAlert};

/// Result of an ingest call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum IngestOutcome {
    /// The alert was stored and routed.
    Created {
        /// The stored alert.
        alert: Alert,
        /// Who it was routed to.
        recipients: Vec<String>,
        /// Channels that accepted the notification.
        notifications_sent: usize,
    },
    /// An identical alert exists inside the deduplication window.
    Suppressed,
}

impl IngestOutcome {
    /// Returns the stored alert, if one was created.
    #[must_use]
    pub const fn alert(&self) -> Option<&Alert> {
        match self {
            Self::Created { alert, .. } => Some(alert),
            Self::Suppressed => None,
        }
    }

    /// Returns true if the alert was dropped as a duplicate.
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }
}

/// Builder for [`AlertLifecycle`].
#[derive(Debug)]
pub struct LifecycleBuilder {
    config: AlertingConfig,
    store: Option<Arc<dyn AlertStore>>,
    clock: Option<Arc<dyn Clock>>,
    rules: Vec<RoutingRule>,
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl LifecycleBuilder {
    /// Sets the alert store. Defaults to an in-memory store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn AlertStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the time source. Defaults to the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the initial routing table.
    #[must_use]
    pub fn rules(mut self, rules: Vec<RoutingRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Adds a notification channel.
    #[must_use]
    pub fn channel(mut self, channel: Box<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Validates the configuration and builds the facade.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Config` if the configuration is invalid.
    pub fn build(self) -> Result<AlertLifecycle> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryAlertStore::with_clock(clock.clone())));

        let dispatcher = Arc::new(Dispatcher::new());
        for channel in self.channels {
            dispatcher.add_channel(channel);
        }

        let router = Arc::new(Router::with_rules(self.config.routing.clone(), self.rules));
        let dedup = Deduplicator::new(self.config.dedup.clone(), store.clone(), clock.clone());
        let escalator = Escalator::new(
            self.config.escalation.clone(),
            store.clone(),
            router.clone(),
            dispatcher.clone(),
            clock.clone(),
        );
        let aggregator = Aggregator::new(store.clone(), clock.clone());

        Ok(AlertLifecycle {
            config: Arc::new(self.config),
            store,
            clock,
            dedup,
            router,
            escalator,
            aggregator,
            dispatcher,
            locks: Arc::new(IngestLocks::new()),
        })
    }
}

/// Entry point for every alert operation.
#[derive(Debug, Clone)]
pub struct AlertLifecycle {
    config: Arc<AlertingConfig>,
    store: Arc<dyn AlertStore>,
    clock: Arc<dyn Clock>,
    dedup: Deduplicator,
    router: Arc<Router>,
    escalator: Escalator,
    aggregator: Aggregator,
    dispatcher: Arc<Dispatcher>,
    locks: Arc<IngestLocks>,
}

impl AlertLifecycle {
    /// Starts building a facade with `config`.
    #[must_use]
    pub fn builder(config: AlertingConfig) -> LifecycleBuilder {
        LifecycleBuilder {
            config,
            store: None,
            clock: None,
            rules: Vec::new(),
            channels: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AlertingConfig {
        &self.config
    }

    /// Returns the router, for rule management.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the notification dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Deduplicates, stores, routes and notifies.
    ///
    /// The duplicate check and the insert run under a lock keyed by the
    /// alert identity, so concurrent identical reports store one alert.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn ingest(&self, new: NewAlert) -> Result<IngestOutcome> {
        let guard = self.locks.lock(&new.component, &new.alert_type, &new.message);
        if self
            .dedup
            .is_duplicate(&new.component, &new.alert_type, &new.message)?
        {
            debug!(component = %new.component, alert_type = %new.alert_type, "suppressed duplicate alert");
            return Ok(IngestOutcome::Suppressed);
        }
        let alert = self.store.create(new)?;
        drop(guard);

        let resolution = self
            .router
            .resolve(&alert.component, alert.severity, &alert.alert_type);
        info!(
            alert_id = %alert.id,
            component = %alert.component,
            severity = %alert.severity,
            alert_type = %alert.alert_type,
            matched_by = ?resolution.matched_by,
            "alert created"
        );

        let report = self.dispatcher.dispatch(&Notification::created(
            alert.clone(),
            resolution.recipients.clone(),
        ));

        Ok(IngestOutcome::Created {
            alert,
            recipients: resolution.recipients,
            notifications_sent: report.sent,
        })
    }

    /// Moves an active alert to `acknowledged`.
    ///
    /// Returns `false` if the alert does not exist or is not active.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn acknowledge(&self, id: AlertId, user: &str) -> Result<bool> {
        let changed = self.store.update_status(id, AlertStatus::Acknowledged, user)?;
        if changed {
            info!(alert_id = %id, user, "alert acknowledged");
        }
        Ok(changed)
    }

    /// Moves an active or acknowledged alert to `resolved`.
    ///
    /// Returns `false` if the alert does not exist or is already resolved.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn resolve(&self, id: AlertId, user: &str) -> Result<bool> {
        let changed = self.store.update_status(id, AlertStatus::Resolved, user)?;
        if !changed {
            return Ok(false);
        }
        info!(alert_id = %id, user, "alert resolved");

        if self.config.notify_on_resolve {
            if let Some(alert) = self.store.get(id)? {
                let resolution = self
                    .router
                    .resolve(&alert.component, alert.severity, &alert.alert_type);
                self.dispatcher
                    .dispatch(&Notification::resolved(alert, resolution.recipients));
            }
        }
        Ok(true)
    }

    /// Alerts in `status`, optionally for one component, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn list(&self, component: Option<&str>, status: AlertStatus) -> Result<Vec<Alert>> {
        let filter = AlertFilter::new().maybe_component(component).status(status);
        self.store.find(&filter, None)
    }

    /// Fetches one alert.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn show(&self, id: AlertId) -> Result<Option<Alert>> {
        self.store.get(id)
    }

    /// Alerts for `component` created in the last `days` days.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn history(&self, component: &str, days: u32) -> Result<Vec<Alert>> {
        self.aggregator.history(component, days)
    }

    /// Groups recent active alerts. `window_minutes` defaults to the
    /// configured aggregation window.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn aggregate(
        &self,
        component: Option<&str>,
        window_minutes: Option<u32>,
    ) -> Result<Vec<AggregateRow>> {
        let window = window_minutes.unwrap_or(self.config.aggregation_window_minutes);
        self.aggregator.aggregate(component, window)
    }

    /// Unwindowed counts by component, severity and status.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn stats(&self, component: Option<&str>) -> Result<Vec<StatsRow>> {
        self.aggregator.stats(component)
    }

    /// Deletes resolved alerts older than `retention_days` (defaults to the
    /// configured retention). Zero deletes every resolved alert.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn cleanup(&self, retention_days: Option<u32>) -> Result<usize> {
        let days = retention_days.unwrap_or(self.config.retention_days);
        let cutoff = self.clock.ago(Duration::days(i64::from(days)));
        let deleted = self.store.delete_resolved_before(cutoff)?;
        info!(retention_days = days, deleted, "cleanup finished");
        Ok(deleted)
    }

    /// Runs one escalation sweep and returns how many alerts escalated.
    ///
    /// # Errors
    ///
    /// Returns an error only if the active-alert snapshot cannot be read.
    pub fn check_escalation(&self, component: Option<&str>) -> Result<usize> {
        self.escalator.check_escalation(component)
    }

    /// Runs one escalation sweep that stops between alerts on cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error only if the active-alert snapshot cannot be read.
    pub fn check_escalation_until(
        &self,
        component: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SweepReport> {
        self.escalator.check_escalation_until(component, cancel)
    }

    /// Escalates one alert by id.
    ///
    /// With no `level`, escalates only if the alert's age requires it. With a
    /// `level`, it must be exactly one above the current level.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::AlertNotFound` for an unknown id,
    /// `AlertError::Validation` if `level` skips a level, and propagates
    /// store failures.
    pub fn escalate(&self, id: AlertId, level: Option<EscalationLevel>) -> Result<bool> {
        let alert = self
            .store
            .get(id)?
            .ok_or_else(|| AlertError::AlertNotFound { id: id.to_string() })?;
        Ok(self.escalator.escalate(&alert, level)?.is_some())
    }

    /// Resolves recipients for a possibly unknown severity.
    #[must_use]
    pub fn route(&self, component: &str, severity: &str, alert_type: &str) -> Resolution {
        self.router.resolve_raw(component, severity, alert_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::NotificationResult;
    use crate::clock::ManualClock;
    use crate::config::DedupConfig;
    use crate::router::MatchedBy;
    use crate::types::{META_ACKNOWLEDGED_BY, Severity};
    use parking_lot::Mutex;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Default)]
    struct RecordingChannel {
        sent: Arc<Mutex<Vec<Notification>>>,
    }

    impl NotificationChannel for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }

        fn send(&self, notification: &Notification) -> Result<NotificationResult> {
            self.sent.lock().push(notification.clone());
            Ok(NotificationResult::success("recording"))
        }
    }

    struct Fixture {
        lifecycle: AlertLifecycle,
        clock: ManualClock,
        sent: Arc<Mutex<Vec<Notification>>>,
    }

    fn fixture_with(config: AlertingConfig) -> Fixture {
        let clock = ManualClock::default();
        let channel = RecordingChannel::default();
        let sent = channel.sent.clone();
        let lifecycle = AlertLifecycle::builder(config)
            .clock(Arc::new(clock.clone()))
            .channel(Box::new(channel))
            .build()
            .unwrap();
        Fixture {
            lifecycle,
            clock,
            sent,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(AlertingConfig::default())
    }

    fn db_down() -> NewAlert {
        NewAlert::new("INGESTION", Severity::Critical, "system_down", "db down").unwrap()
    }

    fn ingest(lifecycle: &AlertLifecycle) -> Alert {
        lifecycle.ingest(db_down()).unwrap().alert().cloned().unwrap()
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn invalid_config_is_rejected() {
            let mut config = AlertingConfig::default();
            config.routing.fallback_recipient = String::new();
            let result = AlertLifecycle::builder(config).build();
            assert!(matches!(result, Err(AlertError::Config { .. })));
        }

        #[test]
        fn initial_rules_are_used() {
            let rule = RoutingRule::parse("INGESTION", "critical", Some("system_down"), vec![
                "db-team".to_string(),
            ])
            .unwrap();
            let lifecycle = AlertLifecycle::builder(AlertingConfig::default())
                .rules(vec![rule])
                .build()
                .unwrap();
            assert_eq!(lifecycle.router().rule_count(), 1);
            let outcome = lifecycle.ingest(db_down()).unwrap();
            assert!(matches!(
                outcome,
                IngestOutcome::Created { ref recipients, .. } if recipients == &["db-team".to_string()]
            ));
        }
    }

    mod ingest_tests {
        use super::*;

        #[test]
        fn ingest_stores_routes_and_notifies() {
            let f = fixture();
            let outcome = f.lifecycle.ingest(db_down()).unwrap();
            let IngestOutcome::Created {
                alert,
                recipients,
                notifications_sent,
            } = outcome
            else {
                panic!("expected created outcome");
            };
            assert_eq!(alert.status, AlertStatus::Active);
            assert_eq!(recipients, vec!["admin@localhost".to_string()]);
            assert_eq!(notifications_sent, 1);
            assert_eq!(f.sent.lock().len(), 1);
        }

        #[test]
        fn duplicate_inside_window_is_suppressed() {
            let f = fixture();
            assert!(!f.lifecycle.ingest(db_down()).unwrap().is_suppressed());
            f.clock.advance_minutes(30);
            assert!(f.lifecycle.ingest(db_down()).unwrap().is_suppressed());

            assert_eq!(f.lifecycle.list(None, AlertStatus::Active).unwrap().len(), 1);
            assert_eq!(f.sent.lock().len(), 1);
        }

        #[test]
        fn duplicates_are_stored_when_dedup_disabled() {
            let f = fixture_with(AlertingConfig {
                dedup: DedupConfig {
                    enabled: false,
                    ..Default::default()
                },
                ..Default::default()
            });
            f.lifecycle.ingest(db_down()).unwrap();
            f.lifecycle.ingest(db_down()).unwrap();
            assert_eq!(f.lifecycle.list(None, AlertStatus::Active).unwrap().len(), 2);
        }

        #[test]
        fn concurrent_identical_ingests_store_one_alert() {
            let f = fixture();
            std::thread::scope(|scope| {
                for _ in 0..8 {
                    let lifecycle = f.lifecycle.clone();
                    scope.spawn(move || lifecycle.ingest(db_down()).unwrap());
                }
            });
            assert_eq!(f.lifecycle.list(None, AlertStatus::Active).unwrap().len(), 1);
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn acknowledge_once() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);

            assert!(f.lifecycle.acknowledge(alert.id, "alice").unwrap());
            let stored = f.lifecycle.show(alert.id).unwrap().unwrap();
            assert_eq!(stored.status, AlertStatus::Acknowledged);
            assert_eq!(stored.metadata[META_ACKNOWLEDGED_BY], "alice");

            assert!(!f.lifecycle.acknowledge(alert.id, "alice").unwrap());
        }

        #[test]
        fn unknown_id_is_false_not_error() {
            let f = fixture();
            assert!(!f.lifecycle.acknowledge(AlertId::generate(), "alice").unwrap());
            assert!(!f.lifecycle.resolve(AlertId::generate(), "alice").unwrap());
            assert!(f.lifecycle.show(AlertId::generate()).unwrap().is_none());
        }

        #[test]
        fn resolve_sets_resolved_at_once() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);
            assert!(f.lifecycle.resolve(alert.id, "bob").unwrap());
            let first = f.lifecycle.show(alert.id).unwrap().unwrap().resolved_at;
            assert!(first.is_some());

            f.clock.advance_minutes(5);
            assert!(!f.lifecycle.resolve(alert.id, "bob").unwrap());
            assert!(!f.lifecycle.acknowledge(alert.id, "bob").unwrap());
            let stored = f.lifecycle.show(alert.id).unwrap().unwrap();
            assert_eq!(stored.resolved_at, first);
            assert_eq!(stored.status, AlertStatus::Resolved);
        }

        #[test]
        fn resolve_notifies_only_when_configured() {
            let quiet = fixture();
            let alert = ingest(&quiet.lifecycle);
            quiet.lifecycle.resolve(alert.id, "bob").unwrap();
            assert_eq!(quiet.sent.lock().len(), 1);

            let loud = fixture_with(AlertingConfig {
                notify_on_resolve: true,
                ..Default::default()
            });
            let alert = ingest(&loud.lifecycle);
            loud.lifecycle.resolve(alert.id, "bob").unwrap();
            let sent = loud.sent.lock();
            assert_eq!(sent.len(), 2);
            assert_eq!(sent[1].body, "Resolved: db down");
        }

        proptest! {
            #[test]
            fn prop_resolved_is_terminal(ops in proptest::collection::vec(any::<bool>(), 0..10)) {
                let f = fixture();
                let alert = ingest(&f.lifecycle);
                f.lifecycle.resolve(alert.id, "ops").unwrap();
                let resolved = f.lifecycle.show(alert.id).unwrap().unwrap();

                for acknowledge in ops {
                    f.clock.advance_minutes(1);
                    let changed = if acknowledge {
                        f.lifecycle.acknowledge(alert.id, "x").unwrap()
                    } else {
                        f.lifecycle.resolve(alert.id, "x").unwrap()
                    };
                    prop_assert!(!changed);
                }

                let after = f.lifecycle.show(alert.id).unwrap().unwrap();
                prop_assert_eq!(after.status, AlertStatus::Resolved);
                prop_assert_eq!(after.resolved_at, resolved.resolved_at);
            }
        }
    }

    mod escalation_tests {
        use super::*;

        #[test]
        fn escalation_scenario() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);

            f.clock.advance_minutes(16);
            assert_eq!(f.lifecycle.check_escalation(None).unwrap(), 1);
            let stored = f.lifecycle.show(alert.id).unwrap().unwrap();
            assert_eq!(stored.escalation_level.get(), 1);
            assert_eq!(
                f.sent.lock().last().unwrap().body,
                "Alert escalated to level 1: db down"
            );

            assert_eq!(f.lifecycle.check_escalation(None).unwrap(), 0);
            f.clock.advance_minutes(13);
            assert_eq!(f.lifecycle.check_escalation(None).unwrap(), 0);
            f.clock.advance_minutes(1);
            assert_eq!(f.lifecycle.check_escalation(None).unwrap(), 1);
        }

        #[test]
        fn acknowledged_alerts_are_not_swept() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);
            f.lifecycle.acknowledge(alert.id, "alice").unwrap();
            f.clock.advance_minutes(120);
            assert_eq!(f.lifecycle.check_escalation(None).unwrap(), 0);
        }

        #[test]
        fn sweep_respects_acknowledgement_from_another_handle() {
            use crate::file_store::JsonFileAlertStore;

            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join("alerts.json");
            let clock = ManualClock::default();
            let open = || {
                let store =
                    JsonFileAlertStore::open(&path, Arc::new(clock.clone())).unwrap();
                AlertLifecycle::builder(AlertingConfig::default())
                    .store(Arc::new(store))
                    .clock(Arc::new(clock.clone()))
                    .build()
                    .unwrap()
            };

            let producer = open();
            let alert = ingest(&producer);
            let watcher = open();
            assert!(open().acknowledge(alert.id, "alice").unwrap());

            clock.advance_minutes(16);
            assert_eq!(watcher.check_escalation(None).unwrap(), 0);

            let stored = open().show(alert.id).unwrap().unwrap();
            assert_eq!(stored.status, AlertStatus::Acknowledged);
            assert!(stored.escalation_level.is_none());
        }

        #[test]
        fn escalate_unknown_id_is_not_found() {
            let f = fixture();
            let result = f.lifecycle.escalate(AlertId::generate(), None);
            assert!(matches!(result, Err(AlertError::AlertNotFound { .. })));
        }

        #[test]
        fn manual_escalation_by_id() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);
            assert!(!f.lifecycle.escalate(alert.id, None).unwrap());
            assert!(f
                .lifecycle
                .escalate(alert.id, Some(EscalationLevel::new(1).unwrap()))
                .unwrap());
        }
    }

    mod read_tests {
        use super::*;

        #[test]
        fn list_filters_status_and_component() {
            let f = fixture();
            let a = ingest(&f.lifecycle);
            f.lifecycle
                .ingest(NewAlert::new("API", Severity::Warning, "latency", "slow").unwrap())
                .unwrap();
            f.lifecycle.resolve(a.id, "ops").unwrap();

            assert_eq!(f.lifecycle.list(None, AlertStatus::Active).unwrap().len(), 1);
            assert_eq!(f.lifecycle.list(None, AlertStatus::Resolved).unwrap().len(), 1);
            assert!(f
                .lifecycle
                .list(Some("INGESTION"), AlertStatus::Active)
                .unwrap()
                .is_empty());
        }

        #[test]
        fn aggregate_defaults_to_configured_window() {
            let f = fixture();
            ingest(&f.lifecycle);
            f.clock.advance_minutes(16);
            assert!(f.lifecycle.aggregate(None, None).unwrap().is_empty());
            assert_eq!(f.lifecycle.aggregate(None, Some(30)).unwrap().len(), 1);
        }

        #[test]
        fn history_with_huge_window_returns_everything() {
            let f = fixture();
            ingest(&f.lifecycle);
            assert_eq!(f.lifecycle.history("INGESTION", u32::MAX).unwrap().len(), 1);
        }

        #[test]
        fn aggregate_with_huge_window() {
            let f = fixture();
            ingest(&f.lifecycle);
            assert_eq!(f.lifecycle.aggregate(None, Some(u32::MAX)).unwrap().len(), 1);
        }

        #[test]
        fn route_with_unknown_severity_falls_back() {
            let f = fixture();
            let resolution = f.lifecycle.route("INGESTION", "bogus", "x");
            assert_eq!(resolution.matched_by, MatchedBy::Fallback);
            assert_eq!(resolution.recipients, vec!["admin@localhost".to_string()]);
        }
    }

    mod cleanup_tests {
        use super::*;

        #[test]
        fn cleanup_zero_deletes_all_resolved() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);
            f.lifecycle.resolve(alert.id, "ops").unwrap();
            assert_eq!(f.lifecycle.cleanup(Some(0)).unwrap(), 1);
            assert!(f.lifecycle.show(alert.id).unwrap().is_none());
        }

        #[test]
        fn cleanup_keeps_active_alerts() {
            let f = fixture();
            ingest(&f.lifecycle);
            assert_eq!(f.lifecycle.cleanup(Some(0)).unwrap(), 0);
        }

        #[test]
        fn cleanup_with_huge_retention_deletes_nothing() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);
            f.lifecycle.resolve(alert.id, "ops").unwrap();
            assert_eq!(f.lifecycle.cleanup(Some(u32::MAX)).unwrap(), 0);
            assert!(f.lifecycle.show(alert.id).unwrap().is_some());
        }

        #[test]
        fn cleanup_default_retention() {
            let f = fixture();
            let alert = ingest(&f.lifecycle);
            f.lifecycle.resolve(alert.id, "ops").unwrap();

            f.clock.advance(Duration::days(179));
            assert_eq!(f.lifecycle.cleanup(None).unwrap(), 0);
            f.clock.advance(Duration::days(2));
            assert_eq!(f.lifecycle.cleanup(None).unwrap(), 1);
        }
    }
}
