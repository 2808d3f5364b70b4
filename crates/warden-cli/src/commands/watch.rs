//! Foreground sweeper: escalation and cleanup until Ctrl-C.

use std::io::Write;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warden_alerts::{EscalationSweeper, SweeperStats};

use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay};
use crate::workspace::Workspace;

/// Handler for `watch`.
pub struct WatchCommand<'a> {
    workspace: &'a Workspace,
}

impl<'a> WatchCommand<'a> {
    /// Creates a new watch command handler.
    #[must_use]
    pub const fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Runs the sweeper until Ctrl-C, then prints its totals.
    ///
    /// # Errors
    ///
    /// Returns error if the sweeper task fails or output fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        interval_secs: Option<u64>,
    ) -> Result<(), CliError> {
        let cancel = CancellationToken::new();
        let signal = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            signal.cancel();
        });

        let stats = self.run_until(interval_secs, cancel).await?;
        format.write(out, &WatchSummary { stats })
    }

    /// Runs the sweeper until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns error if the sweeper task panics.
    pub async fn run_until(
        &self,
        interval_secs: Option<u64>,
        cancel: CancellationToken,
    ) -> Result<SweeperStats, CliError> {
        let mut sweeper = EscalationSweeper::new(self.workspace.lifecycle().clone());
        if let Some(secs) = interval_secs {
            sweeper = sweeper.with_interval(Duration::from_secs(secs.max(1)));
        }
        info!(
            data_dir = %self.workspace.data_dir().display(),
            interval_secs = sweeper.interval().as_secs(),
            "watching alerts"
        );

        sweeper
            .spawn(cancel)
            .await
            .map_err(|e| CliError::Io(std::io::Error::other(e)))
    }
}

/// Totals printed when `watch` stops.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct WatchSummary {
    /// Sweeper totals.
    pub stats: SweeperStats,
}

impl TableDisplay for WatchSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let s = &self.stats;
        writeln!(
            writer,
            "Stopped after {} sweep(s): {} escalated, {} deleted, {} error(s)",
            s.ticks, s.escalated, s.deleted, s.errors
        )?;
        Ok(())
    }
}
