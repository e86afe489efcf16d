mod commands;
mod config;
mod error;
mod session;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use site_content_core::document::DocumentId;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LogFormat};
use crate::error::CliResult;
use crate::session::Session;

#[derive(Debug, Parser)]
#[command(
    name = "site-content",
    version,
    about = "Reconcile singleton site-content documents (footers and the like)"
)]
struct Cli {
    /// Collection to operate on; overrides CONTENT_COLLECTION.
    #[arg(long, global = true, value_name = "NAME")]
    collection: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite the chosen document to canonical and make it the only active one (default).
    Reconcile(DryRunArgs),
    /// List every document with its active flag, shape and link keys.
    Inspect,
    /// Make a specific document the only active one, with canonical content.
    Activate {
        id: DocumentId,
        #[command(flatten)]
        args: DryRunArgs,
    },
    /// Rewrite every legacy-shaped document to canonical, leaving active flags alone.
    #[command(name = "migrate-legacy")]
    MigrateLegacy,
    /// Delete the whole collection and recreate one canonical active document.
    Cleanup {
        /// Actually delete; without it the command only reports.
        #[arg(long)]
        yes: bool,
    },
    /// Check that exactly one document is active.
    Verify,
}

#[derive(Debug, Clone, Default, Args)]
struct DryRunArgs {
    /// Show the plan and payload diff without writing.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;
    if let Some(collection) = &cli.collection {
        config.collection = collection.clone();
    }

    init_tracing(&config)?;

    match run(cli.command.unwrap_or(Command::Reconcile(DryRunArgs::default())), config).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("error[{}]: {err}", err.error_type());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Opens the session, runs one command, and closes the session whatever the outcome.
async fn run(command: Command, config: AppConfig) -> CliResult<()> {
    let session = Session::open(config).await?;

    let result = match command {
        Command::Reconcile(args) => commands::reconcile(&session, None, args.dry_run).await,
        Command::Activate { id, args } => {
            commands::reconcile(&session, Some(id), args.dry_run).await
        }
        Command::Inspect => commands::inspect(&session).await,
        Command::MigrateLegacy => commands::migrate_legacy(&session).await,
        Command::Cleanup { yes } => commands::cleanup(&session, yes).await,
        Command::Verify => commands::verify(&session).await,
    };

    session.close().await;
    result
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_reconcile() {
        let cli = Cli::try_parse_from(["site-content"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn activate_parses_document_id() {
        let cli = Cli::try_parse_from([
            "site-content",
            "--collection",
            "banners",
            "activate",
            "0190f5a2-7c3e-7b8a-9d4e-1f2a3b4c5d6e",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.collection.as_deref(), Some("banners"));
        match cli.command {
            Some(Command::Activate { id, args }) => {
                assert_eq!(id.to_string(), "0190f5a2-7c3e-7b8a-9d4e-1f2a3b4c5d6e");
                assert!(args.dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn activate_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["site-content", "activate", "footer-1"]).is_err());
    }

    #[test]
    fn cleanup_requires_explicit_confirmation_flag() {
        let cli = Cli::try_parse_from(["site-content", "cleanup"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Cleanup { yes: false })));
    }
}
