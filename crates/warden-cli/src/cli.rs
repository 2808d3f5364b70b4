//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use warden_alerts::AlertStatus;

/// Warden - alert lifecycle, routing and escalation.
#[derive(Parser, Debug, Clone)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding alerts.json, rules.json and templates/.
    #[arg(short, long, env = "WARDEN_DATA_DIR", default_value = "./warden-data")]
    pub data_dir: PathBuf,

    /// JSON configuration file. Missing keys take defaults.
    #[arg(short, long, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, env = "WARDEN_LOG_JSON")]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Report a new alert.
    Ingest(IngestArgs),

    /// List alerts.
    List {
        /// Only alerts from this component.
        #[arg(long)]
        component: Option<String>,

        /// Status to list.
        #[arg(short, long, default_value_t = AlertStatus::Active)]
        status: AlertStatus,
    },

    /// Show one alert.
    Show {
        /// Alert ID.
        id: String,
    },

    /// Acknowledge an active alert.
    Ack {
        /// Alert ID.
        id: String,

        /// Who is acknowledging.
        #[arg(short, long, env = "WARDEN_USER", default_value = "cli")]
        user: String,
    },

    /// Resolve an alert.
    Resolve {
        /// Alert ID.
        id: String,

        /// Who is resolving.
        #[arg(short, long, env = "WARDEN_USER", default_value = "cli")]
        user: String,
    },

    /// Group recent active alerts.
    Aggregate {
        /// Only alerts from this component.
        #[arg(long)]
        component: Option<String>,

        /// Window in minutes (defaults to the configured window).
        #[arg(short, long)]
        window: Option<u32>,
    },

    /// Show recent alerts for a component.
    History {
        /// Component name.
        component: String,

        /// How many days back.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Count alerts by component, severity and status.
    Stats {
        /// Only alerts from this component.
        #[arg(long)]
        component: Option<String>,
    },

    /// Delete old resolved alerts.
    Cleanup {
        /// Retention in days (defaults to the configured retention).
        #[arg(long)]
        days: Option<u32>,
    },

    /// Escalate one alert, or sweep all active alerts.
    Escalate(EscalateArgs),

    /// Show who an alert would be routed to.
    Route {
        /// Component name.
        component: String,
        /// Severity.
        severity: String,
        /// Alert type.
        alert_type: String,
    },

    /// Manage routing rules.
    Rules {
        /// Rules subcommand to execute.
        #[command(subcommand)]
        command: RulesCommands,
    },

    /// Manage notification templates.
    Templates {
        /// Templates subcommand to execute.
        #[command(subcommand)]
        command: TemplatesCommands,
    },

    /// Run escalation and cleanup periodically until interrupted.
    Watch {
        /// Seconds between sweeps (defaults to the configured interval).
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

/// Arguments for the ingest command.
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Reporting component.
    pub component: String,

    /// Severity: critical, warning or info.
    pub severity: String,

    /// Alert type.
    pub alert_type: String,

    /// Alert message.
    pub message: String,

    /// Extra metadata (KEY=VALUE, repeatable).
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub meta: Vec<String>,
}

/// Arguments for the escalate command.
#[derive(Args, Debug, Clone)]
pub struct EscalateArgs {
    /// Escalate only this alert.
    #[arg(long)]
    pub id: Option<String>,

    /// Level to escalate to; must be the next level.
    #[arg(long, requires = "id")]
    pub level: Option<u8>,

    /// Limit a sweep to one component.
    #[arg(long, conflicts_with = "id")]
    pub component: Option<String>,
}

/// Routing rule subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum RulesCommands {
    /// Append a rule. Use `*` as a wildcard.
    Add(RuleArgs),

    /// Remove a rule by index, or every rule equal to the given one.
    Remove {
        /// Position in `rules list`.
        #[arg(long, conflicts_with = "rule")]
        index: Option<usize>,

        /// The rule to remove.
        #[command(flatten)]
        rule: OptionalRuleArgs,
    },

    /// List rules in precedence order.
    List,
}

/// A fully specified routing rule.
#[derive(Args, Debug, Clone)]
pub struct RuleArgs {
    /// Component or `*`.
    pub component: String,

    /// Severity or `*`.
    pub severity: String,

    /// Alert type or `*`; omit for a component-level rule.
    pub alert_type: Option<String>,

    /// Recipients (comma-separated).
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub to: Vec<String>,
}

/// A routing rule given as flags, all optional.
#[derive(Args, Debug, Clone)]
#[group(id = "rule", multiple = true)]
pub struct OptionalRuleArgs {
    /// Component or `*`.
    #[arg(long)]
    pub component: Option<String>,

    /// Severity or `*`.
    #[arg(long)]
    pub severity: Option<String>,

    /// Alert type or `*`.
    #[arg(long = "type")]
    pub alert_type: Option<String>,

    /// Recipients (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub to: Vec<String>,
}

/// Template subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum TemplatesCommands {
    /// Create or overwrite a template.
    Add {
        /// Template ID.
        id: String,
        /// Template body.
        body: String,
    },

    /// Print a template.
    Show {
        /// Template ID.
        id: String,
    },

    /// List template IDs.
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_list_defaults() {
        let cli = Cli::parse_from(["warden", "list"]);
        match cli.command {
            Commands::List { component, status } => {
                assert!(component.is_none());
                assert_eq!(status, AlertStatus::Active);
            }
            _ => panic!("expected list command"),
        }
        assert_eq!(cli.format, Format::Table);
    }

    #[test]
    fn cli_parses_status_filter() {
        let cli = Cli::parse_from(["warden", "list", "--status", "resolved"]);
        assert!(matches!(
            cli.command,
            Commands::List {
                status: AlertStatus::Resolved,
                ..
            }
        ));
    }

    #[test]
    fn cli_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["warden", "list", "--status", "open"]).is_err());
    }

    #[test]
    fn cli_parses_ingest_metadata() {
        let cli = Cli::parse_from([
            "warden", "ingest", "INGESTION", "critical", "system_down", "db down", "-m", "host=db1",
        ]);
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.component, "INGESTION");
                assert_eq!(args.meta, vec!["host=db1".to_string()]);
            }
            _ => panic!("expected ingest command"),
        }
    }

    #[test]
    fn cli_parses_rule_add() {
        let cli = Cli::parse_from(["warden", "rules", "add", "API", "*", "--to", "a@x,b@x"]);
        match cli.command {
            Commands::Rules {
                command: RulesCommands::Add(args),
            } => {
                assert_eq!(args.severity, "*");
                assert!(args.alert_type.is_none());
                assert_eq!(args.to.len(), 2);
            }
            _ => panic!("expected rules add"),
        }
    }

    #[test]
    fn cli_rule_remove_index_conflicts_with_rule() {
        let result = Cli::try_parse_from([
            "warden", "rules", "remove", "--index", "0", "--component", "API",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_escalate_level_requires_id() {
        assert!(Cli::try_parse_from(["warden", "escalate", "--level", "1"]).is_err());
    }

    #[test]
    fn cli_respects_format_and_data_dir() {
        let cli = Cli::parse_from(["warden", "--format", "json", "-d", "/tmp/w", "stats"]);
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/w"));
    }
}
