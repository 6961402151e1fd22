use anyhow::{Context, Result};
use colored::Colorize;
use plaidline_core::PlaidlineContext;

pub fn run(ctx: &PlaidlineContext, json: bool) -> Result<()> {
    let service = ctx
        .enrich_service()
        .context("Enrichment is not configured")?;

    let run = service.run().context("Enrichment run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    if run.discovered == 0 {
        println!("No transactions to enrich");
        return Ok(());
    }

    println!(
        "Submitted {} transaction(s) in {} batch(es)",
        run.discovered, run.batches_submitted
    );

    for failure in &run.failed_batches {
        println!(
            "{} batch {} ({} row(s) dropped): {}",
            "Warning".yellow().bold(),
            failure.batch_index,
            failure.size,
            failure.error
        );
    }

    println!(
        "{} {} transaction(s)",
        "Enriched".green().bold(),
        run.enriched.len()
    );

    if let Some(path) = &run.artifact_path {
        println!("Artifact written to {}", path.display());
    }

    Ok(())
}
