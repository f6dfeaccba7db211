//! Routine Sync Job
//!
//! Reads workout routine definitions from a YAML file and reconciles them
//! with the routines database, preserving user progress data.

// routinesync/src/main.rs
mod config;
mod errors;
mod source;
mod store;
mod sync;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use config::{DbConfig, SyncConfig, DEFAULT_ROUTINES_FILE};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Update workout routines from a YAML file
#[derive(Debug, Parser)]
#[command(name = "routinesync", version)]
struct Cli {
    /// Path to YAML file
    #[arg(long, default_value = DEFAULT_ROUTINES_FILE)]
    file: PathBuf,

    /// Preview changes without updating database
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_status(e.kind()));
        }
    };
    init_tracing(cli.verbose);

    match run_app(cli).await {
        Ok(_) => {
            tracing::info!("Routine update job completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("❌ Job failed: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

/// `--help` and `--version` succeed; every other argument error is a failure.
fn usage_exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "routinesync=debug"
    } else {
        "routinesync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

async fn run_app(cli: Cli) -> Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenv::dotenv();

    let db = DbConfig::from_env().context("Failed to load database configuration from environment")?;
    let sync_config = SyncConfig {
        db,
        routines_file: cli.file,
        dry_run: cli.dry_run,
    };

    sync::run_sync_flow(&sync_config)
        .await
        .with_context(|| format!("Sync of {} failed", sync_config.routines_file.display()))?;
    Ok(())
}
