//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Empty listings
//! print nothing as a table and `[]` as JSON.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use warden_alerts::{AggregateRow, Alert, IngestOutcome, Resolution, StatsRow, SweepReport};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A list of alerts.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AlertList {
    /// Alerts, newest first.
    pub alerts: Vec<Alert>,
}

impl TableDisplay for AlertList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.alerts.is_empty() {
            return Ok(());
        }

        writeln!(
            writer,
            "{:<36}  {:<8}  {:<12}  {:>3}  {:<16}  {:<16}  {:<20}  MESSAGE",
            "ID", "SEVERITY", "STATUS", "LVL", "COMPONENT", "TYPE", "CREATED"
        )?;
        writeln!(writer, "{}", "─".repeat(140))?;

        for alert in &self.alerts {
            writeln!(
                writer,
                "{:<36}  {:<8}  {:<12}  {:>3}  {:<16}  {:<16}  {:<20}  {}",
                alert.id,
                alert.severity,
                alert.status,
                alert.escalation_level,
                truncate(&alert.component, 16),
                truncate(&alert.alert_type, 16),
                timestamp(alert.created_at),
                truncate(&alert.message, 60)
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} alert(s)", self.alerts.len())?;
        Ok(())
    }
}

/// One alert in full.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AlertDetail {
    /// The alert.
    pub alert: Alert,
}

impl TableDisplay for AlertDetail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let alert = &self.alert;
        writeln!(writer, "Alert {}", alert.id)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Component:        {}", alert.component)?;
        writeln!(writer, "Severity:         {}", alert.severity)?;
        writeln!(writer, "Type:             {}", alert.alert_type)?;
        writeln!(writer, "Status:           {}", alert.status)?;
        writeln!(writer, "Escalation Level: {}", alert.escalation_level)?;
        writeln!(writer, "Created:          {}", timestamp(alert.created_at))?;
        if let Some(resolved_at) = alert.resolved_at {
            writeln!(writer, "Resolved:         {}", timestamp(resolved_at))?;
        }
        writeln!(writer)?;
        writeln!(writer, "{}", alert.message)?;

        if !alert.metadata.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Metadata")?;
            for (key, value) in &alert.metadata {
                match value {
                    serde_json::Value::String(s) => writeln!(writer, "  {key}: {s}")?,
                    other => writeln!(writer, "  {key}: {other}")?,
                }
            }
        }
        Ok(())
    }
}

/// Result of `ingest`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct IngestReport {
    /// What happened.
    pub outcome: IngestOutcome,
}

impl TableDisplay for IngestReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match &self.outcome {
            IngestOutcome::Created {
                alert, recipients, ..
            } => {
                writeln!(writer, "✓ Alert {} created", alert.id)?;
                writeln!(writer, "  Routed to: {}", recipients.join(", "))?;
            }
            IngestOutcome::Suppressed => {
                writeln!(writer, "Duplicate alert suppressed")?;
            }
        }
        Ok(())
    }
}

/// Result of `ack` or `resolve`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    /// Alert ID.
    pub id: String,
    /// `acknowledged` or `resolved`.
    pub action: String,
    /// Who performed it.
    pub user: String,
    /// Whether the status changed.
    pub success: bool,
}

impl StatusChange {
    /// The one-line summary, also used as the error message on failure.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.success {
            format!("Alert {} {} by {}", self.id, self.action, self.user)
        } else {
            format!("Alert {} not {}", self.id, self.action)
        }
    }
}

impl TableDisplay for StatusChange {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let mark = if self.success { "✓" } else { "✗" };
        writeln!(writer, "{mark} {}", self.summary())?;
        Ok(())
    }
}

/// Rows from `aggregate`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AggregateTable {
    /// Groups, largest first.
    pub rows: Vec<AggregateRow>,
}

impl TableDisplay for AggregateTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.rows.is_empty() {
            return Ok(());
        }

        writeln!(
            writer,
            "{:<16}  {:<8}  {:<20}  {:>5}  LATEST",
            "COMPONENT", "SEVERITY", "TYPE", "COUNT"
        )?;
        writeln!(writer, "{}", "─".repeat(80))?;
        for row in &self.rows {
            writeln!(
                writer,
                "{:<16}  {:<8}  {:<20}  {:>5}  {}",
                truncate(&row.component, 16),
                row.severity,
                truncate(&row.alert_type, 20),
                row.count,
                timestamp(row.latest_created_at)
            )?;
        }
        Ok(())
    }
}

/// Rows from `stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct StatsTable {
    /// Groups by component, severity and status.
    pub rows: Vec<StatsRow>,
}

impl TableDisplay for StatsTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.rows.is_empty() {
            return Ok(());
        }

        writeln!(
            writer,
            "{:<16}  {:<8}  {:<12}  {:>5}  {:<20}  LAST",
            "COMPONENT", "SEVERITY", "STATUS", "COUNT", "FIRST"
        )?;
        writeln!(writer, "{}", "─".repeat(96))?;
        for row in &self.rows {
            writeln!(
                writer,
                "{:<16}  {:<8}  {:<12}  {:>5}  {:<20}  {}",
                truncate(&row.component, 16),
                row.severity,
                row.status,
                row.count,
                timestamp(row.first_created_at),
                timestamp(row.last_created_at)
            )?;
        }
        Ok(())
    }
}

/// Result of `cleanup`.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Resolved alerts deleted.
    pub deleted: usize,
    /// Retention applied, in days.
    pub retention_days: u32,
}

impl TableDisplay for CleanupReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Deleted {} resolved alert(s) older than {} day(s)",
            self.deleted, self.retention_days
        )?;
        Ok(())
    }
}

/// Result of `escalate`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EscalationReport {
    /// A single alert was targeted.
    Single {
        /// Alert ID.
        id: String,
        /// Whether it escalated.
        escalated: bool,
    },
    /// A sweep over active alerts.
    Sweep(SweepReport),
}

impl TableDisplay for EscalationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match self {
            Self::Single { id, escalated: true } => writeln!(writer, "✓ Alert {id} escalated")?,
            Self::Single {
                id,
                escalated: false,
            } => writeln!(writer, "Alert {id} not escalated")?,
            Self::Sweep(report) => {
                writeln!(
                    writer,
                    "Escalated {} of {} active alert(s)",
                    report.escalated, report.examined
                )?;
                if report.failed > 0 {
                    writeln!(writer, "{} alert(s) failed; they will be retried", report.failed)?;
                }
            }
        }
        Ok(())
    }
}

/// Result of `route`.
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    /// Component looked up.
    pub component: String,
    /// Severity looked up.
    pub severity: String,
    /// Type looked up.
    #[serde(rename = "type")]
    pub alert_type: String,
    /// The routing decision.
    #[serde(flatten)]
    pub resolution: Resolution,
}

impl TableDisplay for RouteReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for recipient in &self.resolution.recipients {
            writeln!(writer, "{recipient}")?;
        }
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Formats a timestamp for tables.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Truncate a string to a maximum number of characters.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
