//! Configuration management
//!
//! All runtime configuration comes from the environment (optionally via a
//! .env file loaded by the binary before this module is consulted):
//!
//! - `PLAIDLINE_DATA_DIR` - root data directory (default `data`)
//! - `PLAIDLINE_CURRENCY` - ISO currency code stamped on enrich requests
//! - `PLAID_CLIENT_ID` / `PLAID_SECRET` - enrich endpoint credentials
//! - `PLAID_ENV` - `sandbox`, `development` or `production`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::result::{Error, Result};

/// Fixed default for enrich request currency; statements are Canadian.
const DEFAULT_CURRENCY: &str = "CAD";

/// Plaid environment selector, each mapping to a fixed base endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaidEnvironment {
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    /// Base URL for this environment
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.plaid.com",
            Self::Development => "https://development.plaid.com",
            Self::Production => "https://production.plaid.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for PlaidEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sandbox" => Ok(Self::Sandbox),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(Error::config(format!(
                "Unknown PLAID_ENV '{}' (expected sandbox, development or production)",
                other
            ))),
        }
    }
}

/// Credentials and environment for the Plaid API
#[derive(Debug, Clone)]
pub struct PlaidConfig {
    pub client_id: String,
    pub secret: String,
    pub environment: PlaidEnvironment,
}

/// Plaidline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root data directory holding fetched files and the database
    pub data_dir: PathBuf,
    /// Currency code stamped on every enrich request
    pub currency_code: String,
    /// Plaid credentials; absent when only file ingestion is needed
    pub plaid: Option<PlaidConfig>,
}

impl Config {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let data_dir = std::env::var("PLAIDLINE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let currency_code =
            std::env::var("PLAIDLINE_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());

        let plaid = match (std::env::var("PLAID_CLIENT_ID"), std::env::var("PLAID_SECRET")) {
            (Ok(client_id), Ok(secret)) => {
                let env_name =
                    std::env::var("PLAID_ENV").unwrap_or_else(|_| "development".to_string());
                Some(PlaidConfig {
                    client_id,
                    secret,
                    environment: env_name.parse()?,
                })
            }
            _ => None,
        };

        Ok(Self {
            data_dir,
            currency_code,
            plaid,
        })
    }

    /// Landing directory for fetched liability files and enrich artifacts
    pub fn fetched_files_dir(&self) -> PathBuf {
        self.data_dir.join("fetched-files")
    }

    /// Path of the DuckDB database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("plaidline.duckdb")
    }

    /// Config rooted at an explicit data directory (used by tests and the
    /// CLI --data-dir override)
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.data_dir = dir.to_path_buf();
        self
    }

    /// Plaid config or a configuration error naming the missing variables
    pub fn require_plaid(&self) -> Result<&PlaidConfig> {
        self.plaid.as_ref().ok_or_else(|| {
            Error::config("PLAID_CLIENT_ID and PLAID_SECRET must be set for enrichment")
        })
    }
}
