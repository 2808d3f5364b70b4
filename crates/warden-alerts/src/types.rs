//! Core types for the alerting engine.
//!
//! This module provides the fundamental types used throughout the warden-alerts crate:
//! - [`Severity`]: The severity level of an alert
//! - [`AlertStatus`]: The lifecycle state of an alert
//! - [`AlertId`]: Opaque unique alert identifier
//! - [`EscalationLevel`]: How many age thresholds an alert has crossed
//! - [`NewAlert`]: A validated ingest request
//! - [`Alert`]: A stored alert record
//! - [`AlertFilter`]: Query filters understood by an alert store

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AlertError, Result};

/// Metadata key: who acknowledged the alert.
pub const META_ACKNOWLEDGED_BY: &str = "acknowledged_by";
/// Metadata key: when the alert was acknowledged.
pub const META_ACKNOWLEDGED_AT: &str = "acknowledged_at";
/// Metadata key: who resolved the alert.
pub const META_RESOLVED_BY: &str = "resolved_by";
/// Metadata key: when the alert was last escalated.
pub const META_ESCALATED_AT: &str = "escalated_at";
/// Metadata key: recipients of the last escalation.
pub const META_ESCALATION_RECIPIENTS: &str = "escalation_recipients";

/// The severity level of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Requires immediate attention.
    Critical,
    /// Should be investigated.
    Warning,
    /// Informational, never escalates.
    Info,
}

impl Severity {
    /// All severities, most urgent first.
    pub const ALL: [Self; 3] = [Self::Critical, Self::Warning, Self::Info];

    /// Returns the severity as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Returns the priority of this severity (higher = more urgent).
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Info => 1,
            Self::Warning => 2,
            Self::Critical => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "critical" => Ok(Self::Critical),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            other => Err(AlertError::validation(format!(
                "unknown severity '{other}' (expected critical, warning or info)"
            ))),
        }
    }
}

/// The lifecycle state of an alert.
///
/// Transitions only move forward: `active -> acknowledged -> resolved`
/// or `active -> resolved`. `resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Newly created and unhandled.
    Active,
    /// Someone is looking at it.
    Acknowledged,
    /// Closed.
    Resolved,
}

impl AlertStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
        }
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Acknowledged)
                | (Self::Active, Self::Resolved)
                | (Self::Acknowledged, Self::Resolved)
        )
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "acknowledged" => Ok(Self::Acknowledged),
            "resolved" => Ok(Self::Resolved),
            other => Err(AlertError::validation(format!(
                "unknown status '{other}' (expected active, acknowledged or resolved)"
            ))),
        }
    }
}

/// Opaque unique alert identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlertId {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| AlertError::validation(format!("malformed alert id '{s}': {e}")))
    }
}

/// Escalation level of an alert, bounded to `0..=3`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct EscalationLevel(u8);

impl EscalationLevel {
    /// Not escalated.
    pub const NONE: Self = Self(0);
    /// Highest level.
    pub const MAX: Self = Self(3);

    /// Creates a level, rejecting values above [`Self::MAX`].
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Validation` if `level > 3`.
    pub fn new(level: u8) -> Result<Self> {
        if level > Self::MAX.0 {
            return Err(AlertError::validation(format!(
                "escalation level {level} out of range 0..=3"
            )));
        }
        Ok(Self(level))
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Returns the next level, or `None` at the top.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        if self.0 >= Self::MAX.0 {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }

    /// Returns true if the alert has never been escalated.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for EscalationLevel {
    type Error = AlertError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EscalationLevel> for u8 {
    fn from(level: EscalationLevel) -> Self {
        level.0
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A validated request to record a new alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    /// Reporting subsystem.
    pub component: String,
    /// Severity.
    pub severity: Severity,
    /// Free-form category (e.g. `data_quality`).
    pub alert_type: String,
    /// Human-readable text.
    pub message: String,
    /// Caller-supplied context.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl NewAlert {
    /// Maximum allowed length for component and type identifiers.
    pub const MAX_IDENT_LENGTH: usize = 128;

    /// Creates a new ingest request.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Validation` if component, type or message is
    /// empty, an identifier has leading or trailing whitespace, or an
    /// identifier exceeds [`Self::MAX_IDENT_LENGTH`].
    pub fn new(
        component: impl Into<String>,
        severity: Severity,
        alert_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self> {
        let component: String = component.into();
        let alert_type: String = alert_type.into();
        let message: String = message.into();

        check_ident("component", &component)?;
        check_ident("alert type", &alert_type)?;
        if message.trim().is_empty() {
            return Err(AlertError::validation("message cannot be empty"));
        }

        Ok(Self {
            component,
            severity,
            alert_type,
            message,
            metadata: BTreeMap::new(),
        })
    }

    /// Parses the severity from a string and creates the request.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Validation` on an unknown severity or empty field.
    pub fn parse(component: &str, severity: &str, alert_type: &str, message: &str) -> Result<Self> {
        Self::new(component, severity.parse()?, alert_type, message)
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

fn check_ident(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AlertError::validation(format!("{field} cannot be empty")));
    }
    if value.trim() != value {
        return Err(AlertError::validation(format!(
            "{field} '{value}' has leading or trailing whitespace"
        )));
    }
    if value.len() > NewAlert::MAX_IDENT_LENGTH {
        return Err(AlertError::validation(format!(
            "{field} exceeds maximum length of {} characters",
            NewAlert::MAX_IDENT_LENGTH
        )));
    }
    Ok(())
}

/// A stored alert record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier.
    pub id: AlertId,
    /// Reporting subsystem.
    pub component: String,
    /// Severity.
    pub severity: Severity,
    /// Free-form category.
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Human-readable text.
    pub message: String,
    /// Lifecycle state.
    pub status: AlertStatus,
    /// Creation time; never changes.
    pub created_at: DateTime<Utc>,
    /// Set once, when the alert is resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Current escalation level.
    #[serde(default)]
    pub escalation_level: EscalationLevel,
    /// Open key-value map for bookkeeping and caller context.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Alert {
    /// Materializes an ingest request as an `active` alert created at `now`.
    #[must_use]
    pub fn from_new(new: NewAlert, now: DateTime<Utc>) -> Self {
        Self {
            id: AlertId::generate(),
            component: new.component,
            severity: new.severity,
            alert_type: new.alert_type,
            message: new.message,
            status: AlertStatus::Active,
            created_at: now,
            resolved_at: None,
            escalation_level: EscalationLevel::NONE,
            metadata: new.metadata,
        }
    }

    /// Returns true while the alert is eligible for escalation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Age of the alert in whole minutes at `now` (never negative).
    #[must_use]
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.created_at).num_minutes().max(0)
    }

    /// Applies a status transition in place.
    ///
    /// Returns `false` and leaves the alert untouched if the transition is
    /// not legal.
    pub fn transition(&mut self, next: AlertStatus, actor: &str, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        let stamp = serde_json::Value::String(now.to_rfc3339());
        match next {
            AlertStatus::Acknowledged => {
                self.metadata
                    .insert(META_ACKNOWLEDGED_BY.to_string(), actor.into());
                self.metadata.insert(META_ACKNOWLEDGED_AT.to_string(), stamp);
            }
            AlertStatus::Resolved => {
                self.resolved_at = Some(now);
                self.metadata.insert(META_RESOLVED_BY.to_string(), actor.into());
            }
            AlertStatus::Active => {}
        }
        true
    }

    /// Returns true if the alert matches every set field of `filter`.
    #[must_use]
    pub fn matches(&self, filter: &AlertFilter) -> bool {
        filter.component.as_ref().is_none_or(|c| &self.component == c)
            && filter.status.is_none_or(|s| self.status == s)
            && filter.severity.is_none_or(|s| self.severity == s)
            && filter.alert_type.as_ref().is_none_or(|t| &self.alert_type == t)
            && filter.message.as_ref().is_none_or(|m| &self.message == m)
            && filter.created_after.is_none_or(|t| self.created_at >= t)
            && filter.created_before.is_none_or(|t| self.created_at <= t)
    }
}

/// Query filters understood by an alert store. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// Exact component.
    pub component: Option<String>,
    /// Exact status.
    pub status: Option<AlertStatus>,
    /// Exact severity.
    pub severity: Option<Severity>,
    /// Exact alert type.
    pub alert_type: Option<String>,
    /// Exact message.
    pub message: Option<String>,
    /// Created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Created at or before this instant.
    pub created_before: Option<DateTime<Utc>>,
}

impl AlertFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a component.
    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Restricts to a component when one is given.
    #[must_use]
    pub fn maybe_component(mut self, component: Option<&str>) -> Self {
        self.component = component.map(str::to_string);
        self
    }

    /// Restricts to a status.
    #[must_use]
    pub const fn status(mut self, status: AlertStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to a severity.
    #[must_use]
    pub const fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Restricts to an alert type.
    #[must_use]
    pub fn alert_type(mut self, alert_type: impl Into<String>) -> Self {
        self.alert_type = Some(alert_type.into());
        self
    }

    /// Restricts to an exact message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Restricts to alerts created at or after `since`.
    #[must_use]
    pub const fn created_after(mut self, since: DateTime<Utc>) -> Self {
        self.created_after = Some(since);
        self
    }

    /// Restricts to alerts created at or before `until`.
    #[must_use]
    pub const fn created_before(mut self, until: DateTime<Utc>) -> Self {
        self.created_before = Some(until);
        self
    }
}
