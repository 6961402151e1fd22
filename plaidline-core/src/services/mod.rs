//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one stage of the pipeline.

pub mod enrich;
pub mod ingest;
pub mod migration;

pub use enrich::{BatchFailure, EnrichService, EnrichmentRun, BATCH_SIZE};
pub use ingest::{
    parse_bank_label, DirectoryImportResult, FileOutcome, IngestResult, IngestService,
};
pub use migration::{MigrationResult, MigrationService};
