//! On-disk state the CLI operates on.
//!
//! A data directory holds `alerts.json` (the alert store snapshot),
//! `rules.json` (the routing table) and `templates/`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use warden_alerts::{
    AlertLifecycle, AlertingConfig, JsonFileAlertStore, LogChannel, RoutingRule, RuleFile,
    RuleSelector, SystemClock, TemplateStore,
};

use crate::error::CliError;

/// Alert store file name inside the data directory.
pub const ALERTS_FILE: &str = "alerts.json";
/// Routing table file name inside the data directory.
pub const RULES_FILE: &str = "rules.json";
/// Template directory name inside the data directory.
pub const TEMPLATES_DIR: &str = "templates";

/// The engine wired to a data directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    data_dir: PathBuf,
    lifecycle: AlertLifecycle,
    rules: RuleFile,
    templates: TemplateStore,
}

impl Workspace {
    /// Opens the data directory, loading configuration, alerts and rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unreadable or invalid, or the
    /// alert or rule files are corrupt.
    pub fn open(data_dir: &Path, config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => AlertingConfig::from_json_file(path)
                .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?,
            None => AlertingConfig::default(),
        };

        let clock = Arc::new(SystemClock);
        let store = JsonFileAlertStore::open(data_dir.join(ALERTS_FILE), clock.clone())?;
        let rules = RuleFile::new(data_dir.join(RULES_FILE));
        let table = rules.load()?;
        debug!(data_dir = %data_dir.display(), alerts = store.len(), rules = table.len(), "opened workspace");

        let lifecycle = AlertLifecycle::builder(config)
            .store(Arc::new(store))
            .clock(clock)
            .rules(table)
            .channel(Box::new(LogChannel::default()))
            .build()?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            lifecycle,
            rules,
            templates: TemplateStore::new(data_dir.join(TEMPLATES_DIR)),
        })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the alert lifecycle.
    #[must_use]
    pub const fn lifecycle(&self) -> &AlertLifecycle {
        &self.lifecycle
    }

    /// Returns the template store.
    #[must_use]
    pub const fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Appends a rule to `rules.json` and the live router.
    ///
    /// The file is re-read under its lock first, so rules added by other
    /// processes since this workspace opened are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule file cannot be read or written.
    pub fn add_rule(&self, rule: RoutingRule) -> Result<(), CliError> {
        let router = self.lifecycle.router();
        self.rules.update(|table| {
            router.replace_rules(std::mem::take(table));
            router.add(rule);
            *table = router.list();
        })?;
        Ok(())
    }

    /// Removes rules from `rules.json` and the live router, returning how
    /// many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule file cannot be read or written.
    pub fn remove_rules(&self, selector: &RuleSelector) -> Result<usize, CliError> {
        let router = self.lifecycle.router();
        let removed = self.rules.update(|table| {
            router.replace_rules(std::mem::take(table));
            let removed = router.remove(selector);
            *table = router.list();
            removed
        })?;
        Ok(removed)
    }
}
