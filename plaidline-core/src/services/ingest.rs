//! Ingest service - liability document ingestion
//!
//! Decomposes a fetched liability document into one ledger row, one row per
//! credit account and one row per APR tier, all written inside a single
//! database transaction. The directory driver isolates failures at file
//! granularity: one bad file is logged and recorded, the rest still run.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::LiabilityDocument;

/// Naming convention for fetched liability files
const FILE_PREFIX: &str = "plaid_liabilities_";
const FILE_SUFFIX: &str = ".json";

/// Extract the bank label from a liability file name
///
/// Accepts only `plaid_liabilities_<bank_label>.json` with a non-empty
/// label; anything else is a validation error rather than a panic on a
/// malformed name.
pub fn parse_bank_label(file_name: &str) -> Result<String> {
    let label = file_name
        .strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
        .filter(|label| !label.is_empty())
        .ok_or_else(|| {
            Error::validation(format!(
                "File name '{}' does not match {}<bank_label>{}",
                file_name, FILE_PREFIX, FILE_SUFFIX
            ))
        })?;
    Ok(label.to_string())
}

/// Whether a directory entry is a candidate liability file
fn matches_convention(file_name: &str) -> bool {
    file_name.starts_with(FILE_PREFIX) && file_name.ends_with(FILE_SUFFIX)
}

/// Counts for one successfully ingested document
#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    /// Ledger id shared by every row of this document
    pub import_id: i64,
    pub accounts: usize,
    pub aprs: usize,
}

/// Outcome of one file within a directory run
#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingested: Option<IngestResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated outcome of a directory run
#[derive(Debug, Serialize)]
pub struct DirectoryImportResult {
    pub outcomes: Vec<FileOutcome>,
}

impl DirectoryImportResult {
    pub fn files_ingested(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn files_failed(&self) -> usize {
        self.outcomes.len() - self.files_ingested()
    }
}

/// Ingest service for liability documents
pub struct IngestService {
    repository: Arc<DuckDbRepository>,
}

impl IngestService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Ingest one parsed liability document
    ///
    /// Writes the ledger row and all line items in one transaction; a
    /// failure anywhere leaves zero rows for this document.
    pub fn ingest(
        &self,
        document: &LiabilityDocument,
        bank_label: &str,
        file_name: &str,
    ) -> Result<IngestResult> {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        let description = format!(
            "Liabilities data for {} fetched at {}",
            bank_label, timestamp
        );

        let (import_id, accounts, aprs) =
            self.repository
                .ingest_liabilities(file_name, &description, &document.credit)?;

        info!(
            file = file_name,
            bank = bank_label,
            import_id,
            accounts,
            aprs,
            "ingested liability document"
        );

        Ok(IngestResult {
            import_id,
            accounts,
            aprs,
        })
    }

    /// Parse and ingest a single liability file
    pub fn ingest_file(&self, path: &Path) -> Result<IngestResult> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::validation(format!("Unreadable file name: {:?}", path)))?;
        let bank_label = parse_bank_label(file_name)?;

        let raw = std::fs::read_to_string(path)?;
        let document: LiabilityDocument = serde_json::from_str(&raw).map_err(|e| {
            Error::validation(format!("Invalid liability document {}: {}", file_name, e))
        })?;

        self.ingest(&document, &bank_label, file_name)
    }

    /// Ingest every liability file in the landing directory
    ///
    /// Files that do not match the naming convention are skipped. A file
    /// that fails (malformed name, invalid document, store error) is logged
    /// and recorded in its outcome; the remaining files still run.
    pub fn import_directory(&self, dir: &Path) -> Result<DirectoryImportResult> {
        let mut file_names: Vec<String> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| matches_convention(name))
            .collect();
        file_names.sort();

        let mut outcomes = Vec::new();
        for file_name in file_names {
            let bank_label = parse_bank_label(&file_name).ok();
            match self.ingest_file(&dir.join(&file_name)) {
                Ok(result) => outcomes.push(FileOutcome {
                    file_name,
                    bank_label,
                    ingested: Some(result),
                    error: None,
                }),
                Err(e) => {
                    error!(
                        file = file_name.as_str(),
                        bank = bank_label.as_deref().unwrap_or("unknown"),
                        error = %e,
                        "failed to ingest liability file"
                    );
                    outcomes.push(FileOutcome {
                        file_name,
                        bank_label,
                        ingested: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(DirectoryImportResult { outcomes })
    }
}
