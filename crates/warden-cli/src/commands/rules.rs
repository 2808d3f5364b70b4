//! Routing commands: `route` and `rules add|remove|list`.

use std::io::Write;

use serde::Serialize;
use warden_alerts::{RoutingRule, RuleSelector};

use crate::cli::{OptionalRuleArgs, RuleArgs, RulesCommands};
use crate::error::CliError;
use crate::output::{Message, OutputFormat, RouteReport, TableDisplay};
use crate::workspace::Workspace;

/// Handler for routing commands.
pub struct RulesCommand<'a> {
    workspace: &'a Workspace,
}

impl<'a> RulesCommand<'a> {
    /// Creates a new rules command handler.
    #[must_use]
    pub const fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Executes a rules subcommand.
    ///
    /// # Errors
    ///
    /// Returns error on an invalid rule or when the table cannot be saved.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &RulesCommands,
    ) -> Result<(), CliError> {
        match command {
            RulesCommands::Add(args) => self.add(out, format, args),
            RulesCommands::Remove { index, rule } => self.remove(out, format, *index, rule),
            RulesCommands::List => self.list(out, format),
        }
    }

    /// Prints who an alert would be routed to.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails.
    pub fn route<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        component: &str,
        severity: &str,
        alert_type: &str,
    ) -> Result<(), CliError> {
        let resolution = self
            .workspace
            .lifecycle()
            .route(component, severity, alert_type);
        format.write(
            out,
            &RouteReport {
                component: component.to_string(),
                severity: severity.to_string(),
                alert_type: alert_type.to_string(),
                resolution,
            },
        )
    }

    fn add<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &RuleArgs,
    ) -> Result<(), CliError> {
        let rule = RoutingRule::parse(
            &args.component,
            &args.severity,
            args.alert_type.as_deref(),
            args.to.clone(),
        )?;
        let text = rule.to_string();
        self.workspace.add_rule(rule)?;
        format.write(out, &Message::success(format!("Added rule {text}")))
    }

    fn remove<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        index: Option<usize>,
        rule: &OptionalRuleArgs,
    ) -> Result<(), CliError> {
        let selector = match index {
            Some(index) => RuleSelector::Index(index),
            None => RuleSelector::Rule(rule_from_flags(rule)?),
        };
        let removed = self.workspace.remove_rules(&selector)?;
        format.write(out, &Message::info(format!("Removed {removed} rule(s)")))
    }

    fn list<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let rules = self.workspace.lifecycle().router().list();
        format.write(out, &RuleList { rules })
    }
}

fn rule_from_flags(args: &OptionalRuleArgs) -> Result<RoutingRule, CliError> {
    let (Some(component), Some(severity)) = (&args.component, &args.severity) else {
        return Err(CliError::InvalidArgument(
            "give --index, or --component, --severity and --to".to_string(),
        ));
    };
    Ok(RoutingRule::parse(
        component,
        severity,
        args.alert_type.as_deref(),
        args.to.clone(),
    )?)
}

/// The routing table in precedence order.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RuleList {
    /// Rules, first match wins.
    pub rules: Vec<RoutingRule>,
}

impl TableDisplay for RuleList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for (index, rule) in self.rules.iter().enumerate() {
            writeln!(writer, "{index:>3}  {rule}")?;
        }
        Ok(())
    }
}
