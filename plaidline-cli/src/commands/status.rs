use anyhow::{Context, Result};
use colored::Colorize;
use plaidline_core::PlaidlineContext;

pub fn run(ctx: &PlaidlineContext, json: bool) -> Result<()> {
    let counts = ctx
        .repository
        .table_counts()
        .context("Failed to read table counts")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    println!("{}", "Pipeline status".bold());
    println!("  Imports:            {}", counts.imports);
    println!("  Liability accounts: {}", counts.liability_accounts);
    println!("  APR entries:        {}", counts.apr_entries);
    println!("  Transactions:       {}", counts.transactions);
    println!("  Database:           {}", ctx.repository.db_path().display());

    Ok(())
}
