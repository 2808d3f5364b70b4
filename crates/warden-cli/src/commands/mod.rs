//! CLI command implementations.
//!
//! Each submodule implements a group of commands against a
//! [`Workspace`](crate::workspace::Workspace):
//! - [`alert`] - Ingest, list, show, ack, resolve, escalate
//! - [`report`] - Aggregate, history, stats, cleanup
//! - [`rules`] - Routing lookups and the rule table
//! - [`templates`] - Notification templates
//! - [`watch`] - Periodic escalation and cleanup

pub mod alert;
pub mod report;
pub mod rules;
pub mod templates;
pub mod watch;

pub use alert::AlertCommand;
pub use report::ReportCommand;
pub use rules::RulesCommand;
pub use templates::TemplatesCommand;
pub use watch::WatchCommand;
