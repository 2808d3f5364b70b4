//! CLI error types.

use std::fmt;

use warden_alerts::AlertError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// The alerting engine refused or failed the operation.
    Alert(AlertError),
    /// Invalid configuration.
    Config(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// The operation was a no-op (e.g. acknowledging a resolved alert).
    ///
    /// The message has already been written to the output.
    Rejected(String),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl CliError {
    /// Returns true if the error has already been reported on stdout.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alert(e) => write!(f, "{e}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Rejected(msg) => f.write_str(msg),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Alert(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AlertError> for CliError {
    fn from(err: AlertError) -> Self {
        Self::Alert(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_alert() {
        let err = CliError::from(AlertError::AlertNotFound { id: "abc".into() });
        assert_eq!(err.to_string(), "alert not found: abc");
    }

    #[test]
    fn cli_error_display_invalid_argument() {
        let err = CliError::InvalidArgument("bad metadata".into());
        assert_eq!(err.to_string(), "invalid argument: bad metadata");
    }

    #[test]
    fn rejected_is_already_reported() {
        assert!(CliError::Rejected("not acknowledged".into()).is_reported());
        assert!(!CliError::Config("x".into()).is_reported());
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
