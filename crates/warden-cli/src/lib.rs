//! # warden-cli
//!
//! Warden command-line interface.
//!
//! Provides commands for:
//! - Reporting alerts and triaging them (ack, resolve)
//! - Routing lookups and rule management
//! - Aggregates, history and statistics
//! - Manual and periodic escalation
//!
//! # Architecture
//!
//! Every invocation opens a [`workspace::Workspace`]: a data directory
//! holding the alert store, the routing table and the templates. Commands
//! run against the [`warden_alerts::AlertLifecycle`] it wires up.
//!
//! ```text
//! ┌────────────┐               ┌───────────────┐      ┌──────────────┐
//! │ warden-cli │──────────────►│ warden-alerts │─────►│ alerts.json  │
//! └────────────┘   lifecycle   └───────────────┘      │ rules.json   │
//!                                                     │ templates/   │
//!                                                     └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod workspace;

pub use cli::{Cli, Commands, Format, RulesCommands, TemplatesCommands};
pub use error::CliError;
pub use output::OutputFormat;
pub use workspace::Workspace;
