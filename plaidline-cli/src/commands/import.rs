use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use plaidline_core::PlaidlineContext;

pub fn run(ctx: &PlaidlineContext, dir: Option<&Path>, json: bool) -> Result<()> {
    let default_dir = ctx.config.fetched_files_dir();
    let dir = dir.unwrap_or(&default_dir);

    let result = ctx
        .ingest_service
        .import_directory(dir)
        .with_context(|| format!("Failed to import from {}", dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.outcomes.is_empty() {
        println!("No liability files found in {}", dir.display());
        return Ok(());
    }

    for outcome in &result.outcomes {
        if let Some(ingested) = &outcome.ingested {
            println!(
                "{} {} (import #{}: {} accounts, {} APR entries)",
                "Ingested".green().bold(),
                outcome.file_name,
                ingested.import_id,
                ingested.accounts,
                ingested.aprs
            );
        } else {
            let reason = outcome.error.as_deref().unwrap_or("unknown error");
            println!("{} {}: {}", "Failed".red().bold(), outcome.file_name, reason);
        }
    }

    println!(
        "\n{} file(s) ingested, {} failed",
        result.files_ingested().to_string().green(),
        result.files_failed().to_string().red()
    );

    Ok(())
}
