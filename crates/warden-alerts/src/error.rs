//! Error types for the warden-alerts crate.

use thiserror::Error;

/// Errors that can occur in the alerting engine.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Input rejected before any store mutation (bad severity, status, id...).
    #[error("validation failed: {reason}")]
    Validation {
        /// The reason the input is invalid.
        reason: String,
    },

    /// Alert with the given ID was not found.
    #[error("alert not found: {id}")]
    AlertNotFound {
        /// The alert ID that was not found.
        id: String,
    },

    /// The persistence collaborator could not be reached or timed out.
    #[error("alert store unavailable: {reason}")]
    StoreUnavailable {
        /// The reason the store is unavailable.
        reason: String,
    },

    /// Invalid or incomplete configuration.
    #[error("invalid configuration: {reason}")]
    Config {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// Notification delivery failed.
    #[error("notification failed: {reason}")]
    NotificationFailed {
        /// The reason the notification failed.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Filesystem error on rule or template files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlertError {
    /// Shorthand for a validation error.
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Returns true if the failure is transient and the caller may retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;
