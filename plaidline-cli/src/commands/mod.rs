//! CLI command implementations

pub mod enrich;
pub mod import;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};
use plaidline_core::config::Config;
use plaidline_core::PlaidlineContext;

/// Build the pipeline context, optionally rooted at an explicit data dir
pub fn get_context(data_dir: Option<&Path>) -> Result<PlaidlineContext> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(dir) = data_dir {
        config = config.with_data_dir(dir);
    }

    PlaidlineContext::with_config(config).context("Failed to initialize pipeline context")
}
