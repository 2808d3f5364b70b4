//! Notification channels for alert delivery.
//!
//! The engine decides *who* hears about an alert and *when*; channels decide
//! *how* bytes are sent. This module provides the [`NotificationChannel`]
//! trait, the [`Dispatcher`] that fans a notification out to every enabled
//! channel, and a [`LogChannel`] that writes notifications to `tracing`.

use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::types::{Alert, EscalationLevel};

/// Why a notification is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "level")]
pub enum NotificationKind {
    /// A new alert was stored.
    Created,
    /// An alert reached a new escalation level.
    Escalated(EscalationLevel),
    /// An alert was resolved.
    Resolved,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Escalated(level) => write!(f, "escalated({level})"),
            Self::Resolved => f.write_str("resolved"),
        }
    }
}

/// A notification to be sent through a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Why it is sent.
    pub kind: NotificationKind,
    /// The alert it is about.
    pub alert: Alert,
    /// Who should receive it.
    pub recipients: Vec<String>,
    /// One-line summary.
    pub subject: String,
    /// Message body.
    pub body: String,
}

impl Notification {
    /// Notification for a newly stored alert.
    #[must_use]
    pub fn created(alert: Alert, recipients: Vec<String>) -> Self {
        let body = alert.message.clone();
        Self::build(NotificationKind::Created, alert, recipients, body)
    }

    /// Notification for an escalation to `level`.
    #[must_use]
    pub fn escalated(alert: Alert, level: EscalationLevel, recipients: Vec<String>) -> Self {
        let body = format!("Alert escalated to level {level}: {}", alert.message);
        Self::build(NotificationKind::Escalated(level), alert, recipients, body)
    }

    /// Notification for a resolved alert.
    #[must_use]
    pub fn resolved(alert: Alert, recipients: Vec<String>) -> Self {
        let body = format!("Resolved: {}", alert.message);
        Self::build(NotificationKind::Resolved, alert, recipients, body)
    }

    fn build(kind: NotificationKind, alert: Alert, recipients: Vec<String>, body: String) -> Self {
        let subject = format!(
            "[{}] {}/{}",
            alert.severity.as_str().to_ascii_uppercase(),
            alert.component,
            alert.alert_type
        );
        Self {
            kind,
            alert,
            recipients,
            subject,
            body,
        }
    }
}

/// Result of sending a notification.
#[derive(Debug, Clone)]
pub struct NotificationResult {
    /// Whether the notification was sent successfully.
    pub success: bool,
    /// The channel that processed this notification.
    pub channel: String,
    /// Optional message or error description.
    pub message: Option<String>,
}

impl NotificationResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
        }
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}

/// Trait for notification channels.
///
/// Implement this trait to deliver notifications over mail, chat or any
/// other transport.
pub trait NotificationChannel: Send + Sync + fmt::Debug {
    /// Returns the name of this channel.
    fn name(&self) -> &str;

    /// Sends a notification through this channel.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::NotificationFailed` if the notification cannot be sent.
    fn send(&self, notification: &Notification) -> Result<NotificationResult>;

    /// Returns true if this channel is enabled.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Counts from one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Channels that accepted the notification.
    pub sent: usize,
    /// Channels that failed or errored.
    pub failed: usize,
}

/// Fans notifications out to registered channels.
///
/// Delivery failures are logged and counted; they never fail the alert
/// operation that triggered them.
#[derive(Debug, Default)]
pub struct Dispatcher {
    channels: RwLock<Vec<Box<dyn NotificationChannel>>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a notification channel.
    pub fn add_channel(&self, channel: Box<dyn NotificationChannel>) {
        info!(channel = %channel.name(), "added notification channel");
        self.channels.write().push(channel);
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Sends `notification` through every enabled channel.
    pub fn dispatch(&self, notification: &Notification) -> DispatchReport {
        let channels = self.channels.read();
        let mut report = DispatchReport::default();

        for channel in channels.iter().filter(|c| c.is_enabled()) {
            match channel.send(notification) {
                Ok(result) if result.success => report.sent += 1,
                Ok(result) => {
                    warn!(channel = %result.channel, message = ?result.message, "notification failed");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(channel = %channel.name(), error = %e, "notification error");
                    report.failed += 1;
                }
            }
        }

        debug!(
            alert_id = %notification.alert.id,
            kind = %notification.kind,
            sent = report.sent,
            failed = report.failed,
            "dispatched notification"
        );
        report
    }
}

/// A channel that logs notifications for debugging.
#[derive(Debug, Clone)]
pub struct LogChannel {
    name: String,
    enabled: bool,
}

impl LogChannel {
    /// Creates a new log channel.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    /// Sets whether the channel is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new("log")
    }
}

impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, notification: &Notification) -> Result<NotificationResult> {
        if !self.is_enabled() {
            return Ok(NotificationResult::success(self.name()).with_message("channel disabled"));
        }

        let alert = &notification.alert;
        match notification.kind {
            NotificationKind::Created | NotificationKind::Escalated(_) => {
                error!(
                    alert_id = %alert.id,
                    kind = %notification.kind,
                    severity = %alert.severity,
                    to = ?notification.recipients,
                    subject = %notification.subject,
                    "{}",
                    notification.body
                );
            }
            NotificationKind::Resolved => {
                info!(
                    alert_id = %alert.id,
                    to = ?notification.recipients,
                    subject = %notification.subject,
                    "{}",
                    notification.body
                );
            }
        }

        Ok(NotificationResult::success(self.name()).with_message("logged to tracing"))
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertError;
    use crate::types::{NewAlert, Severity};
    use chrono::Utc;

    fn test_alert() -> Alert {
        let new = NewAlert::new("INGESTION", Severity::Critical, "system_down", "db down").unwrap();
        Alert::from_new(new, Utc::now())
    }

    #[derive(Debug)]
    struct FailingChannel;

    impl NotificationChannel for FailingChannel {
        fn name(&self) -> &str {
            "failing"
        }

        fn send(&self, _notification: &Notification) -> Result<NotificationResult> {
            Err(AlertError::NotificationFailed {
                reason: "connection refused".to_string(),
            })
        }
    }

    #[derive(Debug)]
    struct RejectingChannel;

    impl NotificationChannel for RejectingChannel {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn send(&self, _notification: &Notification) -> Result<NotificationResult> {
            Ok(NotificationResult::failure("rejecting", "mailbox full"))
        }
    }

    mod notification_tests {
        use super::*;

        #[test]
        fn created_uses_alert_message() {
            let n = Notification::created(test_alert(), vec!["ops".to_string()]);
            assert_eq!(n.kind, NotificationKind::Created);
            assert_eq!(n.body, "db down");
            assert_eq!(n.subject, "[CRITICAL] INGESTION/system_down");
        }

        #[test]
        fn escalated_body_names_level() {
            let level = EscalationLevel::new(2).unwrap();
            let n = Notification::escalated(test_alert(), level, vec![]);
            assert_eq!(n.body, "Alert escalated to level 2: db down");
            assert_eq!(n.kind.to_string(), "escalated(2)");
        }

        #[test]
        fn resolved_body() {
            let n = Notification::resolved(test_alert(), vec![]);
            assert_eq!(n.body, "Resolved: db down");
        }

        #[test]
        fn kind_serialization() {
            let json = serde_json::to_value(NotificationKind::Escalated(EscalationLevel::MAX)).unwrap();
            assert_eq!(json["kind"], "escalated");
            assert_eq!(json["level"], 3);
        }
    }

    mod dispatcher_tests {
        use super::*;

        #[test]
        fn dispatch_without_channels() {
            let dispatcher = Dispatcher::new();
            let report = dispatcher.dispatch(&Notification::created(test_alert(), vec![]));
            assert_eq!(report, DispatchReport::default());
        }

        #[test]
        fn dispatch_counts_successes_and_failures() {
            let dispatcher = Dispatcher::new();
            dispatcher.add_channel(Box::new(LogChannel::default()));
            dispatcher.add_channel(Box::new(FailingChannel));
            dispatcher.add_channel(Box::new(RejectingChannel));
            assert_eq!(dispatcher.channel_count(), 3);

            let report = dispatcher.dispatch(&Notification::created(test_alert(), vec![]));
            assert_eq!(report.sent, 1);
            assert_eq!(report.failed, 2);
        }

        #[test]
        fn disabled_channels_are_skipped() {
            let dispatcher = Dispatcher::new();
            dispatcher.add_channel(Box::new(LogChannel::new("off").enabled(false)));
            let report = dispatcher.dispatch(&Notification::created(test_alert(), vec![]));
            assert_eq!(report.sent, 0);
            assert_eq!(report.failed, 0);
        }
    }

    mod log_channel_tests {
        use super::*;

        #[test]
        fn log_channel_default() {
            let channel = LogChannel::default();
            assert_eq!(channel.name(), "log");
            assert!(channel.is_enabled());
        }

        #[test]
        fn log_channel_send() {
            let channel = LogChannel::default();
            let result = channel
                .send(&Notification::resolved(test_alert(), vec!["ops".to_string()]))
                .unwrap();
            assert!(result.success);
        }

        #[test]
        fn log_channel_disabled() {
            let channel = LogChannel::new("disabled").enabled(false);
            let result = channel
                .send(&Notification::created(test_alert(), vec![]))
                .unwrap();
            assert!(result.success);
            assert!(result.message.unwrap().contains("disabled"));
        }
    }
}
