//! Plaidline Core - liability and transaction ingestion pipeline
//!
//! This crate implements the pipeline logic following hexagonal architecture:
//!
//! - **domain**: Core entities (LiabilityDocument, TransactionRow, etc.)
//! - **ports**: Trait definitions for external dependencies (EnrichmentProvider)
//! - **services**: Business logic orchestration (ingest, enrich, migrations)
//! - **adapters**: Concrete implementations (DuckDB, Plaid)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::sync::Arc;

use adapters::duckdb::DuckDbRepository;
use adapters::plaid::PlaidClient;
use config::Config;
use domain::result::{Error, Result};
use services::{EnrichService, IngestService};

// Re-export commonly used types at crate root
pub use adapters::duckdb::TableCounts;
pub use domain::{EnrichedTransaction, LiabilityDocument, TransactionRow};
pub use services::{DirectoryImportResult, EnrichmentRun, IngestResult};

/// Main context for pipeline operations
///
/// Primary entry point for all business logic: holds the store handle and
/// both services, constructed explicitly so callers and tests control every
/// collaborator instead of relying on process-wide singletons.
pub struct PlaidlineContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub ingest_service: IngestService,
    enrich_service: Option<EnrichService>,
}

impl PlaidlineContext {
    /// Create a context from environment configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    /// Create a context from an explicit configuration
    pub fn with_config(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&config.db_path())?);
        repository.ensure_schema()?;

        let ingest_service = IngestService::new(Arc::clone(&repository));

        // Enrichment needs Plaid credentials; without them the context
        // still supports file ingestion.
        let enrich_service = match &config.plaid {
            Some(plaid_config) => {
                let client = Arc::new(PlaidClient::new(plaid_config)?);
                Some(EnrichService::new(
                    Arc::clone(&repository),
                    client,
                    config.currency_code.clone(),
                    config.fetched_files_dir(),
                ))
            }
            None => None,
        };

        Ok(Self {
            config,
            repository,
            ingest_service,
            enrich_service,
        })
    }

    /// The enrich service, or a configuration error when credentials are
    /// missing
    pub fn enrich_service(&self) -> Result<&EnrichService> {
        self.enrich_service.as_ref().ok_or_else(|| {
            Error::config("PLAID_CLIENT_ID and PLAID_SECRET must be set for enrichment")
        })
    }
}
