//! Background escalation and retention sweep.
//!
//! [`EscalationSweeper`] ticks on a fixed interval. Each tick runs one
//! escalation sweep followed by retention cleanup. Failures are logged and
//! the work is retried on the next tick; the loop only ends when its
//! cancellation token fires.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::AlertError;
use crate::lifecycle::AlertLifecycle;

/// Totals accumulated over the sweeper's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweeperStats {
    /// Completed ticks.
    pub ticks: u64,
    /// Alerts escalated.
    pub escalated: usize,
    /// Resolved alerts deleted by retention.
    pub deleted: usize,
    /// Failed sweeps or cleanups.
    pub errors: u64,
}

/// Periodic driver for escalation and cleanup.
#[derive(Debug, Clone)]
pub struct EscalationSweeper {
    lifecycle: AlertLifecycle,
    interval: Duration,
}

impl EscalationSweeper {
    /// Creates a sweeper using the configured sweep interval.
    #[must_use]
    pub fn new(lifecycle: AlertLifecycle) -> Self {
        let interval = Duration::from_secs(lifecycle.config().sweep_interval_secs.max(1));
        Self {
            lifecycle,
            interval,
        }
    }

    /// Overrides the tick interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the loop onto the current runtime.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<SweeperStats> {
        tokio::spawn(self.run(cancel))
    }

    /// Runs until `cancel` fires, then returns the totals.
    pub async fn run(self, cancel: CancellationToken) -> SweeperStats {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats = SweeperStats::default();

        info!(interval_secs = self.interval.as_secs_f64(), "escalation sweeper started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.tick(&cancel, &mut stats).await;
        }
        info!(
            ticks = stats.ticks,
            escalated = stats.escalated,
            deleted = stats.deleted,
            errors = stats.errors,
            "escalation sweeper stopped"
        );
        stats
    }

    async fn tick(&self, cancel: &CancellationToken, stats: &mut SweeperStats) {
        let lifecycle = self.lifecycle.clone();
        let token = cancel.clone();
        let sweep = tokio::task::spawn_blocking(move || {
            let report = lifecycle.check_escalation_until(None, &token);
            let cleanup = if token.is_cancelled() {
                Ok(0)
            } else {
                lifecycle.cleanup(None)
            };
            (report, cleanup)
        })
        .await;

        stats.ticks += 1;
        let (report, cleanup) = match sweep {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "sweep task panicked");
                stats.errors += 1;
                return;
            }
        };

        match report {
            Ok(report) => {
                stats.escalated += report.escalated;
                debug!(
                    examined = report.examined,
                    escalated = report.escalated,
                    failed = report.failed,
                    "sweep tick"
                );
            }
            Err(e) => {
                log_failure("escalation sweep", &e);
                stats.errors += 1;
            }
        }
        match cleanup {
            Ok(deleted) => stats.deleted += deleted,
            Err(e) => {
                log_failure("retention cleanup", &e);
                stats.errors += 1;
            }
        }
    }
}

fn log_failure(task: &str, e: &AlertError) {
    if e.is_transient() {
        warn!(task, error = %e, "transient failure, retrying next tick");
    } else {
        error!(task, error = %e, "failure, retrying next tick");
    }
}
