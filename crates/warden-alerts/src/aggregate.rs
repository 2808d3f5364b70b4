//! Read-side grouping and statistics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::Result;
use crate::store::AlertStore;
use crate::types::{Alert, AlertFilter, AlertStatus, Severity};

/// Active alerts grouped by `(component, severity, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Reporting subsystem.
    pub component: String,
    /// Severity.
    pub severity: Severity,
    /// Alert category.
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Alerts in the group.
    pub count: usize,
    /// Newest creation time in the group.
    pub latest_created_at: DateTime<Utc>,
}

/// All alerts grouped by `(component, severity, status)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRow {
    /// Reporting subsystem.
    pub component: String,
    /// Severity.
    pub severity: Severity,
    /// Lifecycle state.
    pub status: AlertStatus,
    /// Alerts in the group.
    pub count: usize,
    /// Oldest creation time in the group.
    pub first_created_at: DateTime<Utc>,
    /// Newest creation time in the group.
    pub last_created_at: DateTime<Utc>,
}

/// Produces grouped counts over the alert store. Never writes.
#[derive(Debug, Clone)]
pub struct Aggregator {
    store: Arc<dyn AlertStore>,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    /// Creates an aggregator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn AlertStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Groups active alerts created in the last `window_minutes`.
    ///
    /// Rows are ordered by count descending, then newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn aggregate(&self, component: Option<&str>, window_minutes: u32) -> Result<Vec<AggregateRow>> {
        let since = self.clock.ago(Duration::minutes(i64::from(window_minutes)));
        let filter = AlertFilter::new()
            .maybe_component(component)
            .status(AlertStatus::Active)
            .created_after(since);

        let mut groups: HashMap<(String, Severity, String), AggregateRow> = HashMap::new();
        for alert in self.store.find(&filter, None)? {
            let key = (alert.component.clone(), alert.severity, alert.alert_type.clone());
            groups
                .entry(key)
                .and_modify(|row| {
                    row.count += 1;
                    row.latest_created_at = row.latest_created_at.max(alert.created_at);
                })
                .or_insert_with(|| AggregateRow {
                    component: alert.component,
                    severity: alert.severity,
                    alert_type: alert.alert_type,
                    count: 1,
                    latest_created_at: alert.created_at,
                });
        }

        let mut rows: Vec<AggregateRow> = groups.into_values().collect();
        rows.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(b.latest_created_at.cmp(&a.latest_created_at))
                .then_with(|| a.component.cmp(&b.component))
                .then_with(|| a.alert_type.cmp(&b.alert_type))
        });
        Ok(rows)
    }

    /// Groups every stored alert by component, severity and status.
    ///
    /// Rows are ordered by component, then severity (critical first), then
    /// status.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn stats(&self, component: Option<&str>) -> Result<Vec<StatsRow>> {
        let filter = AlertFilter::new().maybe_component(component);

        let mut groups: HashMap<(String, Severity, AlertStatus), StatsRow> = HashMap::new();
        for alert in self.store.find(&filter, None)? {
            let key = (alert.component.clone(), alert.severity, alert.status);
            groups
                .entry(key)
                .and_modify(|row| {
                    row.count += 1;
                    row.first_created_at = row.first_created_at.min(alert.created_at);
                    row.last_created_at = row.last_created_at.max(alert.created_at);
                })
                .or_insert_with(|| StatsRow {
                    component: alert.component,
                    severity: alert.severity,
                    status: alert.status,
                    count: 1,
                    first_created_at: alert.created_at,
                    last_created_at: alert.created_at,
                });
        }

        let mut rows: Vec<StatsRow> = groups.into_values().collect();
        rows.sort_by(|a, b| {
            a.component
                .cmp(&b.component)
                .then(b.severity.priority().cmp(&a.severity.priority()))
                .then(a.status.as_str().cmp(b.status.as_str()))
        });
        Ok(rows)
    }

    /// Alerts for `component` created in the last `days` days, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn history(&self, component: &str, days: u32) -> Result<Vec<Alert>> {
        let since = self.clock.ago(Duration::days(i64::from(days)));
        let filter = AlertFilter::new().component(component).created_after(since);
        self.store.find(&filter, None)
    }
}
