//! Plaidline CLI - liability ingestion and transaction enrichment

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{enrich, import, status};

/// Plaidline - Plaid liability ingestion and enrichment pipeline
#[derive(Parser)]
#[command(name = "plaidline", version, about, long_about = None)]
struct Cli {
    /// Root data directory (overrides PLAIDLINE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import liability files from the landing directory
    Import {
        /// Directory to scan (defaults to <data-dir>/fetched-files)
        dir: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enrich stored transactions via Plaid and write the artifact
    Enrich {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pipeline row counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = commands::get_context(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Import { dir, json } => import::run(&ctx, dir.as_deref(), json),
        Commands::Enrich { json } => enrich::run(&ctx, json),
        Commands::Status { json } => status::run(&ctx, json),
    }
}
