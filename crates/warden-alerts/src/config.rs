//! Engine configuration.
//!
//! All knobs the decision logic reads live here as plain immutable structs
//! handed to constructors. There is no global configuration state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AlertError, Result};
use crate::types::Severity;

/// Configuration for ingest-time deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Whether identical alerts inside the window are suppressed.
    pub enabled: bool,
    /// Suppression window in minutes.
    pub window_minutes: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_minutes: 60,
        }
    }
}

/// Configuration for age-based escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Whether escalation runs at all.
    pub enabled: bool,
    /// Level-1 threshold for critical alerts, in minutes.
    pub level1_minutes: u32,
    /// Level-2 threshold for critical alerts, in minutes.
    pub level2_minutes: u32,
    /// Level-3 threshold for critical alerts, in minutes.
    pub level3_minutes: u32,
    /// Recipients notified at levels 1, 2 and 3.
    pub level_recipients: [Vec<String>; 3],
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level1_minutes: 15,
            level2_minutes: 30,
            level3_minutes: 60,
            level_recipients: [Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

impl EscalationConfig {
    /// Multiplier applied to the critical thresholds for warning alerts.
    pub const WARNING_MULTIPLIER: i64 = 2;

    /// Returns the `(t1, t2, t3)` minute thresholds for a severity, or
    /// `None` if alerts of that severity never escalate.
    #[must_use]
    pub fn thresholds(&self, severity: Severity) -> Option<[i64; 3]> {
        let base = [
            i64::from(self.level1_minutes),
            i64::from(self.level2_minutes),
            i64::from(self.level3_minutes),
        ];
        match severity {
            Severity::Critical => Some(base),
            Severity::Warning => Some(base.map(|t| t * Self::WARNING_MULTIPLIER)),
            Severity::Info => None,
        }
    }

    fn validate(&self) -> Result<()> {
        let [t1, t2, t3] = [self.level1_minutes, self.level2_minutes, self.level3_minutes];
        if t1 == 0 {
            return Err(AlertError::Config {
                reason: "escalation level-1 threshold must be positive".to_string(),
            });
        }
        if !(t1 < t2 && t2 < t3) {
            return Err(AlertError::Config {
                reason: format!(
                    "escalation thresholds must be strictly increasing, got {t1}/{t2}/{t3}"
                ),
            });
        }
        Ok(())
    }
}

/// Default recipients used when no routing rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Recipients for unmatched critical alerts.
    pub critical_recipients: Vec<String>,
    /// Recipients for unmatched warning alerts.
    pub warning_recipients: Vec<String>,
    /// Recipients for unmatched info alerts.
    pub info_recipients: Vec<String>,
    /// Last-resort address for anything else.
    pub fallback_recipient: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            critical_recipients: Vec::new(),
            warning_recipients: Vec::new(),
            info_recipients: Vec::new(),
            fallback_recipient: "admin@localhost".to_string(),
        }
    }
}

impl RoutingConfig {
    /// Returns the default recipients for a severity, falling back to the
    /// admin address when that list is empty.
    #[must_use]
    pub fn defaults_for(&self, severity: Severity) -> Vec<String> {
        let list = match severity {
            Severity::Critical => &self.critical_recipients,
            Severity::Warning => &self.warning_recipients,
            Severity::Info => &self.info_recipients,
        };
        if list.is_empty() {
            self.fallback()
        } else {
            list.clone()
        }
    }

    /// The fallback address as a recipient list.
    #[must_use]
    pub fn fallback(&self) -> Vec<String> {
        vec![self.fallback_recipient.clone()]
    }
}

/// Top-level configuration for the alerting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Deduplication settings.
    pub dedup: DedupConfig,
    /// Escalation settings.
    pub escalation: EscalationConfig,
    /// Routing defaults.
    pub routing: RoutingConfig,
    /// Default window for `aggregate`, in minutes.
    pub aggregation_window_minutes: u32,
    /// Resolved alerts older than this many days are deleted by cleanup.
    pub retention_days: u32,
    /// Whether resolving an alert notifies its routed recipients.
    pub notify_on_resolve: bool,
    /// How often the background sweeper runs, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            dedup: DedupConfig::default(),
            escalation: EscalationConfig::default(),
            routing: RoutingConfig::default(),
            aggregation_window_minutes: 15,
            retention_days: 180,
            notify_on_resolve: false,
            sweep_interval_secs: 60,
        }
    }
}

impl AlertingConfig {
    /// Loads a configuration from a JSON file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Io` if the file cannot be read and
    /// `AlertError::SerializationError` if it is not valid JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Checks for latent misconfiguration. Intended to run once at startup.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Config` if the fallback recipient is empty,
    /// escalation thresholds are not strictly increasing, or a window is zero.
    pub fn validate(&self) -> Result<()> {
        if self.routing.fallback_recipient.trim().is_empty() {
            return Err(AlertError::Config {
                reason: "fallback recipient is empty".to_string(),
            });
        }
        if self.dedup.enabled && self.dedup.window_minutes == 0 {
            return Err(AlertError::Config {
                reason: "deduplication window must be positive".to_string(),
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(AlertError::Config {
                reason: "sweep interval must be positive".to_string(),
            });
        }
        if self.escalation.enabled {
            self.escalation.validate()?;
        }
        Ok(())
    }
}
