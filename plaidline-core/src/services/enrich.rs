//! Enrich service - batched transaction enrichment
//!
//! Reads raw statement transactions, normalizes them for the enrich
//! endpoint, submits them in fixed-size batches and aggregates the partial
//! results. A failed batch degrades the run instead of aborting it: its
//! rows are dropped from the output and the failure is recorded with the
//! batch index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::Result;
use crate::domain::{ClientTransaction, EnrichedTransaction, TransactionRow};
use crate::ports::EnrichmentProvider;

/// Rows per enrich request, fixed by the pipeline contract
pub const BATCH_SIZE: usize = 100;

/// Account-type tag submitted with every batch
const ACCOUNT_TYPE: &str = "credit";

/// One rejected batch within an enrichment run
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Zero-based position of the batch in submission order
    pub batch_index: usize,
    pub size: usize,
    pub error: String,
}

/// Aggregated outcome of one enrichment run
#[derive(Debug, Serialize)]
pub struct EnrichmentRun {
    /// Raw rows read from the store
    pub discovered: usize,
    pub batches_submitted: usize,
    pub failed_batches: Vec<BatchFailure>,
    /// Enriched rows in original relative order, omitting failed batches
    pub enriched: Vec<EnrichedTransaction>,
    /// Where the artifact was written, when any rows survived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
}

impl EnrichmentRun {
    /// A run is clean when no batch was rejected
    pub fn is_clean(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

/// Enrich service driving the external enrichment provider
pub struct EnrichService {
    repository: Arc<DuckDbRepository>,
    provider: Arc<dyn EnrichmentProvider>,
    currency_code: String,
    artifact_dir: PathBuf,
}

impl EnrichService {
    pub fn new(
        repository: Arc<DuckDbRepository>,
        provider: Arc<dyn EnrichmentProvider>,
        currency_code: String,
        artifact_dir: PathBuf,
    ) -> Self {
        Self {
            repository,
            provider,
            currency_code,
            artifact_dir,
        }
    }

    /// Enrich an ordered sequence of raw transactions
    ///
    /// Empty input returns an empty run without touching the provider.
    pub fn enrich(&self, transactions: &[TransactionRow]) -> EnrichmentRun {
        let mut enriched = Vec::new();
        let mut failed_batches = Vec::new();
        let mut batches_submitted = 0usize;

        for (batch_index, chunk) in transactions.chunks(BATCH_SIZE).enumerate() {
            let batch: Vec<ClientTransaction> = chunk
                .iter()
                .map(|row| ClientTransaction::from_row(row, &self.currency_code))
                .collect();

            batches_submitted += 1;
            match self.provider.enrich_batch(ACCOUNT_TYPE, &batch) {
                Ok(results) => enriched.extend(results),
                Err(e) => {
                    error!(
                        provider = self.provider.name(),
                        batch_index,
                        size = chunk.len(),
                        error = %e,
                        "enrichment batch rejected; its rows are dropped from the output"
                    );
                    failed_batches.push(BatchFailure {
                        batch_index,
                        size: chunk.len(),
                        error: e.to_string(),
                    });
                }
            }
        }

        EnrichmentRun {
            discovered: transactions.len(),
            batches_submitted,
            failed_batches,
            enriched,
            artifact_path: None,
        }
    }

    /// Read all stored transactions, enrich them and write the artifact
    ///
    /// The artifact is written once, after every batch has completed; a run
    /// that produced no enriched rows writes nothing.
    pub fn run(&self) -> Result<EnrichmentRun> {
        let transactions = self.repository.get_transactions()?;
        let mut run = self.enrich(&transactions);

        if !run.enriched.is_empty() {
            run.artifact_path = Some(self.write_artifact(&run.enriched)?);
        }

        Ok(run)
    }

    fn write_artifact(&self, enriched: &[EnrichedTransaction]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.artifact_dir)?;

        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let path = self
            .artifact_dir
            .join(format!("plaid_enriched_{}.json", timestamp));

        let content = serde_json::to_string_pretty(enriched)?;
        std::fs::write(&path, content)?;

        info!(path = %path.display(), rows = enriched.len(), "enriched data saved");
        Ok(path)
    }

    /// Artifact directory this service writes into
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;
    use crate::domain::{Direction, Enrichments};
    use std::sync::Mutex;

    /// Provider double that records batch sizes and fails chosen batches
    struct ScriptedProvider {
        fail_batches: Vec<usize>,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedProvider {
        fn new(fail_batches: Vec<usize>) -> Self {
            Self {
                fail_batches,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_sizes(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl EnrichmentProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn enrich_batch(
            &self,
            _account_type: &str,
            batch: &[ClientTransaction],
        ) -> crate::domain::result::Result<Vec<EnrichedTransaction>> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push(batch.len());

            if self.fail_batches.contains(&index) {
                return Err(Error::enrichment("scripted failure"));
            }

            Ok(batch
                .iter()
                .map(|tx| EnrichedTransaction {
                    id: tx.id.clone(),
                    description: tx.description.clone(),
                    amount: tx.amount,
                    direction: tx.direction,
                    enrichments: Enrichments::default(),
                })
                .collect())
        }
    }

    fn rows(n: usize) -> Vec<TransactionRow> {
        (0..n)
            .map(|i| TransactionRow {
                transaction_id: i as i64 + 1,
                payee: format!("PAYEE {}", i),
                amount: "-5.00".parse().unwrap(),
                currency: Some("CAD".to_string()),
            })
            .collect()
    }

    fn service(provider: Arc<ScriptedProvider>) -> (EnrichService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(DuckDbRepository::new(&dir.path().join("test.duckdb")).unwrap());
        repo.ensure_schema().unwrap();
        let svc = EnrichService::new(
            repo,
            provider,
            "CAD".to_string(),
            dir.path().join("fetched-files"),
        );
        (svc, dir)
    }

    #[test]
    fn test_empty_input_makes_no_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (svc, _dir) = service(provider.clone());

        let run = svc.enrich(&[]);
        assert_eq!(run.discovered, 0);
        assert_eq!(run.batches_submitted, 0);
        assert!(run.enriched.is_empty());
        assert!(provider.call_sizes().is_empty());
    }

    #[test]
    fn test_250_rows_make_three_batches_in_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (svc, _dir) = service(provider.clone());

        let run = svc.enrich(&rows(250));
        assert_eq!(provider.call_sizes(), vec![100, 100, 50]);
        assert_eq!(run.batches_submitted, 3);
        assert!(run.is_clean());

        // Concatenated output preserves original row order
        let ids: Vec<String> = run.enriched.iter().map(|e| e.id.clone()).collect();
        let expected: Vec<String> = (1..=250).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_middle_batch_failure_drops_only_its_rows() {
        let provider = Arc::new(ScriptedProvider::new(vec![1]));
        let (svc, _dir) = service(provider.clone());

        let run = svc.enrich(&rows(250));
        assert_eq!(run.batches_submitted, 3);
        assert_eq!(run.failed_batches.len(), 1);
        assert_eq!(run.failed_batches[0].batch_index, 1);
        assert_eq!(run.failed_batches[0].size, 100);

        // First and third batches survive in original relative order
        let ids: Vec<String> = run.enriched.iter().map(|e| e.id.clone()).collect();
        let expected: Vec<String> = (1..=100)
            .chain(201..=250)
            .map(|i| i.to_string())
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_direction_and_ordering_survive_normalization() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (svc, _dir) = service(provider);

        let mut input = rows(2);
        input[0].amount = "-42.50".parse().unwrap();
        input[1].amount = "10.00".parse().unwrap();

        let run = svc.enrich(&input);
        assert_eq!(run.enriched[0].direction, Direction::Outflow);
        assert_eq!(run.enriched[0].amount, "42.50".parse::<rust_decimal::Decimal>().unwrap());
        assert_eq!(run.enriched[1].direction, Direction::Inflow);
        assert_eq!(run.enriched[1].amount, "10.00".parse::<rust_decimal::Decimal>().unwrap());
    }
}
