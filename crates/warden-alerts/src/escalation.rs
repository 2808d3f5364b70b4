//! Age-based escalation.
//!
//! Only `active` alerts escalate. Critical alerts cross levels 1, 2 and 3 at
//! the configured thresholds, warning alerts at twice those thresholds, and
//! info alerts never.
//!
//! Every escalation write advances exactly one level. The evaluation still
//! reports the highest level an alert's age justifies, so an old alert that
//! was never escalated climbs one level per sweep until it catches up. A
//! manual escalation may name a level, but only the next one.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channels::{Dispatcher, Notification};
use crate::clock::Clock;
use crate::config::EscalationConfig;
use crate::error::{AlertError, Result};
use crate::router::Router;
use crate::store::AlertStore;
use crate::types::{Alert, AlertFilter, AlertStatus, EscalationLevel};

/// Outcome of evaluating one alert against the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationDecision {
    /// Level the alert is at now.
    pub current: EscalationLevel,
    /// Highest level its age justifies.
    pub target: EscalationLevel,
}

impl EscalationDecision {
    /// The level the next escalation write will set.
    #[must_use]
    pub fn next(&self) -> EscalationLevel {
        self.current.next().unwrap_or(EscalationLevel::MAX)
    }
}

/// A successful escalation.
#[derive(Debug, Clone)]
pub struct Escalation {
    /// The alert after escalation.
    pub alert: Alert,
    /// Level before.
    pub from: EscalationLevel,
    /// Level after.
    pub to: EscalationLevel,
    /// Who was notified.
    pub recipients: Vec<String>,
}

/// Counts from one escalation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Active alerts in the snapshot.
    pub examined: usize,
    /// Alerts escalated by one level.
    pub escalated: usize,
    /// Alerts whose processing failed; retried next sweep.
    pub failed: usize,
    /// Whether the sweep stopped early on cancellation.
    pub cancelled: bool,
}

/// Evaluates and applies escalation.
#[derive(Debug, Clone)]
pub struct Escalator {
    config: EscalationConfig,
    store: Arc<dyn AlertStore>,
    router: Arc<Router>,
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
}

impl Escalator {
    /// Creates an escalator.
    #[must_use]
    pub fn new(
        config: EscalationConfig,
        store: Arc<dyn AlertStore>,
        router: Arc<Router>,
        dispatcher: Arc<Dispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            router,
            dispatcher,
            clock,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Evaluates `alert` at the current time.
    ///
    /// Returns `None` when the alert is not active, is `info`, escalation is
    /// disabled, or its age does not justify a level above the current one.
    #[must_use]
    pub fn needs_escalation(&self, alert: &Alert) -> Option<EscalationDecision> {
        if !self.config.enabled || !alert.is_active() {
            return None;
        }
        let [t1, t2, t3] = self.config.thresholds(alert.severity)?;
        let age = alert.age_minutes(self.clock.now());
        let current = alert.escalation_level.get();

        let target = if age >= t3 && current < 3 {
            3
        } else if age >= t2 && current < 2 {
            2
        } else if age >= t1 && current < 1 {
            1
        } else {
            return None;
        };

        Some(EscalationDecision {
            current: alert.escalation_level,
            target: EscalationLevel::new(target).ok()?,
        })
    }

    /// Recipients for `level`, falling back to the routing fallback address.
    #[must_use]
    pub fn recipients_for(&self, level: EscalationLevel) -> Vec<String> {
        let configured = usize::from(level.get())
            .checked_sub(1)
            .and_then(|i| self.config.level_recipients.get(i))
            .filter(|list| !list.is_empty());
        match configured {
            Some(list) => list.clone(),
            None => self.router.config().fallback(),
        }
    }

    /// Escalates `alert` by one level.
    ///
    /// Without `requested`, the alert must currently need escalation. With
    /// `requested`, the age check is skipped but the level must be the next
    /// one: a level at or below the current one is a no-op.
    ///
    /// Returns `None` when nothing was written, including when another actor
    /// acknowledged, resolved or escalated the alert first.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Validation` if `requested` skips a level, and
    /// propagates store failures.
    pub fn escalate(
        &self,
        alert: &Alert,
        requested: Option<EscalationLevel>,
    ) -> Result<Option<Escalation>> {
        let from = alert.escalation_level;
        let Some(to) = from.next() else {
            debug!(alert_id = %alert.id, "alert already at highest escalation level");
            return Ok(None);
        };

        match requested {
            None => {
                if self.needs_escalation(alert).is_none() {
                    warn!(alert_id = %alert.id, level = %from, "escalation not needed");
                    return Ok(None);
                }
            }
            Some(level) if level <= from => {
                warn!(alert_id = %alert.id, current = %from, requested = %level, "alert already at or above requested level");
                return Ok(None);
            }
            Some(level) if level > to => {
                return Err(AlertError::validation(format!(
                    "cannot escalate alert {} from level {from} to {level}: levels advance one at a time",
                    alert.id
                )));
            }
            Some(_) => {}
        }

        if !alert.is_active() {
            warn!(alert_id = %alert.id, status = %alert.status, "only active alerts escalate");
            return Ok(None);
        }

        let recipients = self.recipients_for(to);
        if !self
            .store
            .record_escalation(alert.id, from, to, &recipients)?
        {
            debug!(alert_id = %alert.id, "escalation skipped, alert changed concurrently");
            return Ok(None);
        }

        let updated = match self.store.get(alert.id)? {
            Some(updated) => updated,
            None => {
                let mut copy = alert.clone();
                copy.escalation_level = to;
                copy
            }
        };

        info!(
            alert_id = %alert.id,
            component = %alert.component,
            severity = %alert.severity,
            from = %from,
            to = %to,
            recipients = ?recipients,
            "alert escalated"
        );
        self.dispatcher
            .dispatch(&Notification::escalated(updated.clone(), to, recipients.clone()));

        Ok(Some(Escalation {
            alert: updated,
            from,
            to,
            recipients,
        }))
    }

    /// Runs one sweep over active alerts and returns how many escalated.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial snapshot cannot be read.
    pub fn check_escalation(&self, component: Option<&str>) -> Result<usize> {
        let report = self.check_escalation_until(component, &CancellationToken::new())?;
        Ok(report.escalated)
    }

    /// Runs one sweep, stopping between alerts once `cancel` fires.
    ///
    /// Each alert is re-read, evaluated and written independently; a failure
    /// on one alert is logged and counted without aborting the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial snapshot cannot be read.
    pub fn check_escalation_until(
        &self,
        component: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SweepReport> {
        let filter = AlertFilter::new()
            .maybe_component(component)
            .status(AlertStatus::Active);
        let ids: Vec<_> = self
            .store
            .find(&filter, None)?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let mut report = SweepReport {
            examined: ids.len(),
            ..SweepReport::default()
        };

        for id in ids {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let outcome = self.store.get(id).and_then(|current| match current {
                Some(alert) if self.needs_escalation(&alert).is_some() => self.escalate(&alert, None),
                _ => Ok(None),
            });
            match outcome {
                Ok(Some(_)) => report.escalated += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(alert_id = %id, error = %e, "escalation failed, will retry next sweep");
                    report.failed += 1;
                }
            }
        }

        debug!(
            examined = report.examined,
            escalated = report.escalated,
            failed = report.failed,
            cancelled = report.cancelled,
            "escalation sweep finished"
        );
        Ok(report)
    }
}
