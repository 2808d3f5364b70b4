//! Alert command implementation.
//!
//! Handles ingest, listing, inspection, status changes and escalation.

use std::io::Write;

use warden_alerts::{AlertId, AlertStatus, EscalationLevel, NewAlert};

use crate::cli::{EscalateArgs, IngestArgs};
use crate::error::CliError;
use crate::output::{
    AlertDetail, AlertList, EscalationReport, IngestReport, OutputFormat, StatusChange,
};
use crate::workspace::Workspace;

/// Handler for alert commands.
pub struct AlertCommand<'a> {
    workspace: &'a Workspace,
}

impl<'a> AlertCommand<'a> {
    /// Creates a new alert command handler.
    #[must_use]
    pub const fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Reports a new alert.
    ///
    /// # Errors
    ///
    /// Returns error on invalid input or store failure.
    pub fn ingest<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &IngestArgs,
    ) -> Result<(), CliError> {
        let mut alert = NewAlert::parse(
            &args.component,
            &args.severity,
            &args.alert_type,
            &args.message,
        )?;
        for pair in &args.meta {
            let (key, value) = parse_key_value(pair)?;
            alert = alert.with_metadata(key, value);
        }

        let outcome = self.workspace.lifecycle().ingest(alert)?;
        format.write(out, &IngestReport { outcome })
    }

    /// Lists alerts in a status.
    ///
    /// # Errors
    ///
    /// Returns error on store failure.
    pub fn list<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        component: Option<&str>,
        status: AlertStatus,
    ) -> Result<(), CliError> {
        let alerts = self.workspace.lifecycle().list(component, status)?;
        format.write(out, &AlertList { alerts })
    }

    /// Shows one alert; prints nothing for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns error on a malformed id or store failure.
    pub fn show<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
    ) -> Result<(), CliError> {
        let id: AlertId = id.parse()?;
        if let Some(alert) = self.workspace.lifecycle().show(id)? {
            format.write(out, &AlertDetail { alert })?;
        }
        Ok(())
    }

    /// Acknowledges an alert.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Rejected`] if the alert was not acknowledged.
    pub fn acknowledge<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        user: &str,
    ) -> Result<(), CliError> {
        let alert_id: AlertId = id.parse()?;
        let success = self.workspace.lifecycle().acknowledge(alert_id, user)?;
        report_change(out, format, id, AlertStatus::Acknowledged, user, success)
    }

    /// Resolves an alert.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Rejected`] if the alert was not resolved.
    pub fn resolve<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        user: &str,
    ) -> Result<(), CliError> {
        let alert_id: AlertId = id.parse()?;
        let success = self.workspace.lifecycle().resolve(alert_id, user)?;
        report_change(out, format, id, AlertStatus::Resolved, user, success)
    }

    /// Escalates one alert, or sweeps all active alerts.
    ///
    /// # Errors
    ///
    /// Returns error on an unknown id, a level that skips ahead, or store
    /// failure.
    pub fn escalate<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &EscalateArgs,
    ) -> Result<(), CliError> {
        let lifecycle = self.workspace.lifecycle();
        let report = match &args.id {
            Some(id) => {
                let alert_id: AlertId = id.parse()?;
                let level = args.level.map(EscalationLevel::new).transpose()?;
                EscalationReport::Single {
                    id: id.clone(),
                    escalated: lifecycle.escalate(alert_id, level)?,
                }
            }
            None => EscalationReport::Sweep(lifecycle.check_escalation_until(
                args.component.as_deref(),
                &tokio_util::sync::CancellationToken::new(),
            )?),
        };
        format.write(out, &report)
    }
}

fn report_change<W: Write>(
    out: &mut W,
    format: &OutputFormat,
    id: &str,
    status: AlertStatus,
    user: &str,
    success: bool,
) -> Result<(), CliError> {
    let change = StatusChange {
        id: id.to_string(),
        action: status.to_string(),
        user: user.to_string(),
        success,
    };
    format.write(out, &change)?;
    if success {
        Ok(())
    } else {
        Err(CliError::Rejected(change.summary()))
    }
}

fn parse_key_value(pair: &str) -> Result<(&str, &str), CliError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CliError::InvalidArgument(format!(
            "metadata must be KEY=VALUE, got '{pair}'"
        ))),
    }
}
