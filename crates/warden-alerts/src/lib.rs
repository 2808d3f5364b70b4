//! Alert lifecycle and routing engine for Warden.
//!
//! `warden-alerts` takes alerts reported by monitored components, drops
//! repeats, stores them, routes them to recipients by rule, escalates the
//! ones nobody acknowledges, and summarizes what is going on.
//!
//! # Features
//!
//! - **Deduplication**: identical alerts inside a window are suppressed at ingest
//! - **Status State Machine**: `active -> acknowledged -> resolved`, compare-and-set in the store
//! - **Routing**: ordered rule table with wildcard matchers and per-severity defaults
//! - **Escalation**: age-based levels 1-3, warning thresholds doubled, info never escalates
//! - **Aggregation**: windowed group counts and unwindowed statistics
//! - **Sweeper**: async periodic escalation and retention cleanup
//!
//! # Example
//!
//! ```rust
//! use warden_alerts::{
//!     AlertLifecycle, AlertingConfig, AlertStatus, NewAlert, RoutingRule, Severity,
//!     channels::LogChannel,
//! };
//!
//! let lifecycle = AlertLifecycle::builder(AlertingConfig::default())
//!     .channel(Box::new(LogChannel::default()))
//!     .build()
//!     .unwrap();
//!
//! // Route database outages to the DBA team
//! lifecycle.router().add(
//!     RoutingRule::parse("INGESTION", "critical", Some("system_down"), vec!["dba@example.com".into()])
//!         .unwrap(),
//! );
//!
//! let alert = NewAlert::new("INGESTION", Severity::Critical, "system_down", "db down").unwrap();
//! let outcome = lifecycle.ingest(alert.clone()).unwrap();
//! let id = outcome.alert().unwrap().id;
//!
//! // The same report within the dedup window is dropped
//! assert!(lifecycle.ingest(alert).unwrap().is_suppressed());
//!
//! assert!(lifecycle.acknowledge(id, "alice").unwrap());
//! assert!(lifecycle.list(None, AlertStatus::Active).unwrap().is_empty());
//! ```
//!
//! # Escalation
//!
//! Escalation only advances one level per decision, even when an alert's
//! age justifies a higher level. Run [`AlertLifecycle::check_escalation`]
//! periodically, or spawn an [`EscalationSweeper`]:
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use warden_alerts::EscalationSweeper;
//!
//! let cancel = CancellationToken::new();
//! let handle = EscalationSweeper::new(lifecycle.clone()).spawn(cancel.clone());
//! // ...
//! cancel.cancel();
//! let stats = handle.await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod aggregate;
pub mod channels;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod error;
pub mod escalation;
pub mod file_store;
pub mod lifecycle;
mod persist;
pub mod router;
pub mod store;
pub mod sweeper;
pub mod templates;
pub mod types;

// Re-export main types at crate root
pub use aggregate::{AggregateRow, Aggregator, StatsRow};
pub use channels::{
    DispatchReport, Dispatcher, LogChannel, Notification, NotificationChannel, NotificationKind,
    NotificationResult,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AlertingConfig, DedupConfig, EscalationConfig, RoutingConfig};
pub use dedup::{Deduplicator, IngestLocks};
pub use error::{AlertError, Result};
pub use escalation::{Escalation, EscalationDecision, Escalator, SweepReport};
pub use file_store::JsonFileAlertStore;
pub use lifecycle::{AlertLifecycle, IngestOutcome, LifecycleBuilder};
pub use router::{MatchedBy, Matcher, Resolution, Router, RoutingRule, RuleFile, RuleSelector};
pub use store::{AlertStore, MemoryAlertStore};
pub use sweeper::{EscalationSweeper, SweeperStats};
pub use templates::TemplateStore;
pub use types::{
    Alert, AlertFilter, AlertId, AlertStatus, EscalationLevel, NewAlert, Severity,
};
