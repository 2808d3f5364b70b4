//! Warden CLI binary entrypoint.
//!
//! This is the main entry point for the `warden` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use warden_cli::cli::{Cli, Commands};
use warden_cli::commands::{
    AlertCommand, ReportCommand, RulesCommand, TemplatesCommand, WatchCommand,
};
use warden_cli::output::OutputFormat;
use warden_cli::{CliError, Workspace};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_reported() {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let workspace = Workspace::open(&cli.data_dir, cli.config.as_deref())?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Ingest(args) => {
            AlertCommand::new(&workspace).ingest(&mut stdout, &format, &args)?;
        }
        Commands::List { component, status } => {
            AlertCommand::new(&workspace).list(&mut stdout, &format, component.as_deref(), status)?;
        }
        Commands::Show { id } => {
            AlertCommand::new(&workspace).show(&mut stdout, &format, &id)?;
        }
        Commands::Ack { id, user } => {
            AlertCommand::new(&workspace).acknowledge(&mut stdout, &format, &id, &user)?;
        }
        Commands::Resolve { id, user } => {
            AlertCommand::new(&workspace).resolve(&mut stdout, &format, &id, &user)?;
        }
        Commands::Escalate(args) => {
            AlertCommand::new(&workspace).escalate(&mut stdout, &format, &args)?;
        }
        Commands::Aggregate { component, window } => {
            ReportCommand::new(&workspace).aggregate(
                &mut stdout,
                &format,
                component.as_deref(),
                window,
            )?;
        }
        Commands::History { component, days } => {
            ReportCommand::new(&workspace).history(&mut stdout, &format, &component, days)?;
        }
        Commands::Stats { component } => {
            ReportCommand::new(&workspace).stats(&mut stdout, &format, component.as_deref())?;
        }
        Commands::Cleanup { days } => {
            ReportCommand::new(&workspace).cleanup(&mut stdout, &format, days)?;
        }
        Commands::Route {
            component,
            severity,
            alert_type,
        } => {
            RulesCommand::new(&workspace).route(
                &mut stdout,
                &format,
                &component,
                &severity,
                &alert_type,
            )?;
        }
        Commands::Rules { command } => {
            RulesCommand::new(&workspace).execute(&mut stdout, &format, &command)?;
        }
        Commands::Templates { command } => {
            TemplatesCommand::new(&workspace).execute(&mut stdout, &format, &command)?;
        }
        Commands::Watch { interval } => {
            WatchCommand::new(&workspace)
                .execute(&mut stdout, &format, interval)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(dir: &TempDir, args: &[&str]) -> Cli {
        let data_dir = dir.path().to_str().unwrap();
        let mut argv = vec!["warden", "-d", data_dir];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[tokio::test]
    async fn run_ingest_and_list() {
        let dir = TempDir::new().unwrap();
        run(cli(&dir, &["ingest", "API", "warning", "latency", "slow"]))
            .await
            .unwrap();
        run(cli(&dir, &["list"])).await.unwrap();
        assert!(dir.path().join("alerts.json").exists());
    }

    #[tokio::test]
    async fn run_ack_unknown_alert_is_rejected() {
        let dir = TempDir::new().unwrap();
        let id = warden_alerts::AlertId::generate().to_string();
        let result = run(cli(&dir, &["ack", &id])).await;
        assert!(matches!(result, Err(e) if e.is_reported()));
    }

    #[tokio::test]
    async fn run_with_missing_config_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let result = run(cli(&dir, &["-c", missing.to_str().unwrap(), "stats"])).await;
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[tokio::test]
    async fn run_rules_add_persists() {
        let dir = TempDir::new().unwrap();
        run(cli(&dir, &["rules", "add", "API", "*", "--to", "ops"]))
            .await
            .unwrap();
        assert!(dir.path().join("rules.json").exists());
    }
}
