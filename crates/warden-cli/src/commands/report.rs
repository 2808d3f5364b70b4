//! Reporting commands: aggregate, history, stats and cleanup.

use std::io::Write;

use crate::error::CliError;
use crate::output::{AggregateTable, AlertList, CleanupReport, OutputFormat, StatsTable};
use crate::workspace::Workspace;

/// Handler for read-side and retention commands.
pub struct ReportCommand<'a> {
    workspace: &'a Workspace,
}

impl<'a> ReportCommand<'a> {
    /// Creates a new report command handler.
    #[must_use]
    pub const fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Groups recent active alerts.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub fn aggregate<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        component: Option<&str>,
        window: Option<u32>,
    ) -> Result<(), CliError> {
        let rows = self.workspace.lifecycle().aggregate(component, window)?;
        format.write(out, &AggregateTable { rows })
    }

    /// Lists a component's recent alerts.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub fn history<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        component: &str,
        days: u32,
    ) -> Result<(), CliError> {
        let alerts = self.workspace.lifecycle().history(component, days)?;
        format.write(out, &AlertList { alerts })
    }

    /// Counts alerts by component, severity and status.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub fn stats<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        component: Option<&str>,
    ) -> Result<(), CliError> {
        let rows = self.workspace.lifecycle().stats(component)?;
        format.write(out, &StatsTable { rows })
    }

    /// Deletes old resolved alerts.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub fn cleanup<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        days: Option<u32>,
    ) -> Result<(), CliError> {
        let lifecycle = self.workspace.lifecycle();
        let retention_days = days.unwrap_or(lifecycle.config().retention_days);
        let deleted = lifecycle.cleanup(Some(retention_days))?;
        format.write(
            out,
            &CleanupReport {
                deleted,
                retention_days,
            },
        )
    }
}
