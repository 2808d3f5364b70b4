//! Rule-based recipient routing.
//!
//! The [`Router`] resolves who should hear about an alert from an ordered
//! table of [`RoutingRule`]s. Lookup walks a fixed precedence, first match
//! wins within each step:
//!
//! 1. `(component, severity, type)`
//! 2. `(component, *, type)`
//! 3. `(component, severity, *)`
//! 4. `(component, severity)` with the rule's type ignored
//! 5. `(*, *, *)`
//! 6. per-severity defaults from [`RoutingConfig`], then the fallback address
//!
//! Resolution always yields at least one recipient.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use crate::config::RoutingConfig;
use crate::error::{AlertError, Result};
use crate::persist::LockedFile;
use crate::types::Severity;

/// The wildcard token.
pub const WILDCARD: &str = "*";

/// Matches either anything or one literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher<T> {
    /// The `*` wildcard.
    Any,
    /// A literal value.
    Exact(T),
}

impl<T: PartialEq> Matcher<T> {
    /// Returns true for the wildcard.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns true if this is a literal equal to `value`.
    #[must_use]
    pub fn is_exactly(&self, value: &T) -> bool {
        matches!(self, Self::Exact(v) if v == value)
    }

    /// Returns true if `value` is accepted.
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(v) => v == value,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD),
            Self::Exact(v) => write!(f, "{v}"),
        }
    }
}

impl<T> FromStr for Matcher<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        if s == WILDCARD {
            return Ok(Self::Any);
        }
        if s.trim().is_empty() {
            return Err(AlertError::validation("rule field cannot be empty"));
        }
        if s.trim() != s {
            return Err(AlertError::validation(format!(
                "rule field '{s}' has leading or trailing whitespace"
            )));
        }
        s.parse()
            .map(Self::Exact)
            .map_err(|e| AlertError::validation(format!("invalid rule field '{s}': {e}")))
    }
}

impl<T: fmt::Display> Serialize for Matcher<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T> Deserialize<'de> for Matcher<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry of the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Component matcher.
    pub component: Matcher<String>,
    /// Severity matcher.
    pub severity: Matcher<Severity>,
    /// Type matcher; `None` for legacy component-level rules without a type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<Matcher<String>>,
    /// Who to notify.
    pub recipients: Vec<String>,
}

impl RoutingRule {
    /// Parses a rule from its textual fields (`*` is the wildcard).
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Validation` on an unknown severity, an empty
    /// field, or an empty recipient list.
    pub fn parse(
        component: &str,
        severity: &str,
        alert_type: Option<&str>,
        recipients: Vec<String>,
    ) -> Result<Self> {
        let recipients: Vec<String> = recipients
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(AlertError::validation("rule needs at least one recipient"));
        }

        Ok(Self {
            component: component.parse()?,
            severity: severity.parse()?,
            alert_type: alert_type.map(str::parse).transpose()?,
            recipients,
        })
    }

    /// The catch-all `(*, *, *)` rule.
    #[must_use]
    pub const fn wildcard(recipients: Vec<String>) -> Self {
        Self {
            component: Matcher::Any,
            severity: Matcher::Any,
            alert_type: Some(Matcher::Any),
            recipients,
        }
    }

    fn type_is_wildcard_or_absent(&self) -> bool {
        self.alert_type.as_ref().is_none_or(Matcher::is_any)
    }

    fn type_is_exactly(&self, alert_type: &str) -> bool {
        matches!(&self.alert_type, Some(Matcher::Exact(t)) if t == alert_type)
    }
}

impl fmt::Display for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component, self.severity)?;
        if let Some(t) = &self.alert_type {
            write!(f, ":{t}")?;
        }
        write!(f, " -> {}", self.recipients.join(","))
    }
}

/// Which precedence step produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    /// Step 1: exact triple.
    Exact,
    /// Step 2: severity wildcard.
    AnySeverity,
    /// Step 3: type wildcard.
    AnyType,
    /// Step 4: component and severity, type ignored.
    ComponentSeverity,
    /// Step 5: full wildcard.
    Wildcard,
    /// Step 6: per-severity default.
    SeverityDefault,
    /// Step 6: unknown severity, fallback admin address.
    Fallback,
}

/// The outcome of a routing lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Recipients to notify; never empty.
    pub recipients: Vec<String>,
    /// How the recipients were chosen.
    pub matched_by: MatchedBy,
    /// Position of the matching rule, if a rule matched.
    pub rule_index: Option<usize>,
}

/// Selects rules to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSelector {
    /// The rule at this position.
    Index(usize),
    /// Every rule structurally equal to this one.
    Rule(RoutingRule),
}

/// Resolves recipients from an ordered rule table.
#[derive(Debug)]
pub struct Router {
    config: RoutingConfig,
    rules: RwLock<Vec<RoutingRule>>,
}

impl Router {
    /// Creates a router with an empty rule table.
    #[must_use]
    pub fn new(config: RoutingConfig) -> Self {
        Self::with_rules(config, Vec::new())
    }

    /// Creates a router with an initial rule table.
    #[must_use]
    pub fn with_rules(config: RoutingConfig, rules: Vec<RoutingRule>) -> Self {
        Self {
            config,
            rules: RwLock::new(rules),
        }
    }

    /// Returns the routing defaults.
    #[must_use]
    pub const fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Appends a rule. Duplicates are allowed; earlier entries win.
    pub fn add(&self, rule: RoutingRule) {
        info!(rule = %rule, "added routing rule");
        self.rules.write().push(rule);
    }

    /// Removes rules and returns how many were removed.
    ///
    /// Removing something that is not there is not an error.
    pub fn remove(&self, selector: &RuleSelector) -> usize {
        let mut rules = self.rules.write();
        let removed = match selector {
            RuleSelector::Index(index) if *index < rules.len() => {
                rules.remove(*index);
                1
            }
            RuleSelector::Index(_) => 0,
            RuleSelector::Rule(target) => {
                let before = rules.len();
                rules.retain(|r| r != target);
                before - rules.len()
            }
        };
        if removed > 0 {
            info!(selector = ?selector, removed, "removed routing rules");
        } else {
            debug!(selector = ?selector, "no routing rule matched removal");
        }
        removed
    }

    /// Swaps in a new rule table, e.g. one reloaded from disk.
    pub fn replace_rules(&self, rules: Vec<RoutingRule>) {
        *self.rules.write() = rules;
    }

    /// Returns a copy of the rule table in precedence order.
    #[must_use]
    pub fn list(&self) -> Vec<RoutingRule> {
        self.rules.read().clone()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Resolves recipients for a typed severity.
    #[must_use]
    pub fn resolve(&self, component: &str, severity: Severity, alert_type: &str) -> Resolution {
        self.resolve_inner(component, Some(severity), alert_type)
    }

    /// Resolves recipients for an unparsed severity.
    ///
    /// An unknown severity can still match rules with a severity wildcard;
    /// otherwise it falls back to the admin address.
    #[must_use]
    pub fn resolve_raw(&self, component: &str, severity: &str, alert_type: &str) -> Resolution {
        self.resolve_inner(component, severity.parse().ok(), alert_type)
    }

    fn resolve_inner(
        &self,
        component: &str,
        severity: Option<Severity>,
        alert_type: &str,
    ) -> Resolution {
        let rules = self.rules.read();
        let component = component.to_string();
        let severity_is = |rule: &RoutingRule| severity.is_some_and(|s| rule.severity.is_exactly(&s));

        let steps: [(MatchedBy, &dyn Fn(&RoutingRule) -> bool); 5] = [
            (MatchedBy::Exact, &|r: &RoutingRule| {
                r.component.is_exactly(&component) && severity_is(r) && r.type_is_exactly(alert_type)
            }),
            (MatchedBy::AnySeverity, &|r: &RoutingRule| {
                r.component.is_exactly(&component)
                    && r.severity.is_any()
                    && r.type_is_exactly(alert_type)
            }),
            (MatchedBy::AnyType, &|r: &RoutingRule| {
                r.component.is_exactly(&component)
                    && severity_is(r)
                    && matches!(r.alert_type, Some(Matcher::Any))
            }),
            (MatchedBy::ComponentSeverity, &|r: &RoutingRule| {
                r.component.is_exactly(&component) && severity_is(r)
            }),
            (MatchedBy::Wildcard, &|r: &RoutingRule| {
                r.component.is_any() && r.severity.is_any() && r.type_is_wildcard_or_absent()
            }),
        ];

        for (matched_by, predicate) in steps {
            if let Some((index, rule)) = rules.iter().enumerate().find(|&(_, r)| predicate(r)) {
                return Resolution {
                    recipients: rule.recipients.clone(),
                    matched_by,
                    rule_index: Some(index),
                };
            }
        }

        match severity {
            Some(s) => Resolution {
                recipients: self.config.defaults_for(s),
                matched_by: MatchedBy::SeverityDefault,
                rule_index: None,
            },
            None => Resolution {
                recipients: self.config.fallback(),
                matched_by: MatchedBy::Fallback,
                rule_index: None,
            },
        }
    }
}

/// JSON persistence for a routing table.
///
/// Reads and writes hold the file's advisory lock, so concurrent edits from
/// several processes go through [`RuleFile::update`] without losing rules.
#[derive(Debug, Clone)]
pub struct RuleFile {
    file: LockedFile,
}

impl RuleFile {
    /// Creates an adapter for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: LockedFile::new(path),
        }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Loads the table. A missing file is an empty table.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` on read failure and
    /// `AlertError::SerializationError` on malformed content.
    pub fn load(&self) -> Result<Vec<RoutingRule>> {
        self.file.read(parse_rules)
    }

    /// Writes the table, replacing the previous content.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` on write failure.
    pub fn save(&self, rules: &[RoutingRule]) -> Result<()> {
        let json = serde_json::to_vec_pretty(rules)?;
        self.file.update(|_| Ok(((), Some(json))))?;
        debug!(path = %self.path().display(), count = rules.len(), "saved routing rules");
        Ok(())
    }

    /// Loads the table, lets `edit` change it, and writes it back, all under
    /// one exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::StoreUnavailable` on I/O failure and
    /// `AlertError::SerializationError` on malformed content.
    pub fn update<T>(&self, edit: impl FnOnce(&mut Vec<RoutingRule>) -> T) -> Result<T> {
        self.file.update(|raw| {
            let mut rules = parse_rules(raw)?;
            let value = edit(&mut rules);
            let json = serde_json::to_vec_pretty(&rules)?;
            debug!(path = %self.path().display(), count = rules.len(), "saved routing rules");
            Ok((value, Some(json)))
        })
    }
}

fn parse_rules(raw: Option<&str>) -> Result<Vec<RoutingRule>> {
    match raw {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Vec::new()),
    }
}
