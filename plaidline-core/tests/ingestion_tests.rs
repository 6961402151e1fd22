//! Integration tests for the liability ingestion pipeline
//!
//! All database operations run against a real DuckDB file in a temp
//! directory; no network IO is involved on this path.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use plaidline_core::adapters::duckdb::DuckDbRepository;
use plaidline_core::domain::LiabilityDocument;
use plaidline_core::services::IngestService;

// ============================================================================
// Test helpers
// ============================================================================

fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

/// Liability document with the given APR tier counts, one account per entry
fn document_json(apr_counts: &[usize]) -> String {
    let accounts: Vec<String> = apr_counts
        .iter()
        .enumerate()
        .map(|(i, &aprs)| {
            let apr_objects: Vec<String> = (0..aprs)
                .map(|j| {
                    format!(
                        r#"{{"apr_percentage": {}.99, "apr_type": "tier_{}",
                            "balance_subject_to_apr": 500.0, "interest_charge_amount": 7.5}}"#,
                        18 + j,
                        j
                    )
                })
                .collect();
            format!(
                r#"{{
                    "account_id": "acc-{}",
                    "is_overdue": false,
                    "last_payment_amount": 120.0,
                    "last_payment_date": "2024-04-01",
                    "last_statement_issue_date": "2024-03-25",
                    "last_statement_balance": 900.0,
                    "minimum_payment_amount": 25.0,
                    "next_payment_due_date": "2024-04-22",
                    "aprs": [{}]
                }}"#,
                i,
                apr_objects.join(",")
            )
        })
        .collect();
    format!(r#"{{"credit": [{}]}}"#, accounts.join(","))
}

fn parse_document(apr_counts: &[usize]) -> LiabilityDocument {
    serde_json::from_str(&document_json(apr_counts)).unwrap()
}

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

// ============================================================================
// Decomposition
// ============================================================================

#[test]
fn test_ingest_inserts_one_ledger_row_and_all_line_items() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = IngestService::new(Arc::clone(&repo));

    // 3 accounts with 2 + 0 + 3 APR tiers
    let document = parse_document(&[2, 0, 3]);
    let result = service
        .ingest(&document, "mbna", "plaid_liabilities_mbna.json")
        .unwrap();

    assert_eq!(result.accounts, 3);
    assert_eq!(result.aprs, 5);

    // Every row shares the one generated import id
    assert_eq!(repo.count_accounts_for_import(result.import_id).unwrap(), 3);
    assert_eq!(repo.count_aprs_for_import(result.import_id).unwrap(), 5);

    let records = repo.get_import_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, result.import_id);
    assert_eq!(records[0].file_name, "plaid_liabilities_mbna.json");
    assert!(records[0].description.contains("Liabilities data for mbna"));
}

#[test]
fn test_reingest_same_file_name_duplicates_rows() {
    // Documents the current non-idempotent behavior: no uniqueness
    // constraint guards file_name, so a re-run creates a second,
    // independent ledger row with duplicated line items.
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = IngestService::new(Arc::clone(&repo));

    let document = parse_document(&[1, 1]);
    let first = service
        .ingest(&document, "mbna", "plaid_liabilities_mbna.json")
        .unwrap();
    let second = service
        .ingest(&document, "mbna", "plaid_liabilities_mbna.json")
        .unwrap();

    assert_ne!(first.import_id, second.import_id);
    assert_eq!(repo.get_import_records().unwrap().len(), 2);

    let counts = repo.table_counts().unwrap();
    assert_eq!(counts.liability_accounts, 4);
    assert_eq!(counts.apr_entries, 4);
}

#[test]
fn test_ledger_ids_are_strictly_increasing() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);

    let a = repo.record_import("a.json", "first").unwrap();
    let b = repo.record_import("b.json", "second").unwrap();
    assert!(b > a);
}

// ============================================================================
// Directory driver
// ============================================================================

#[test]
fn test_invalid_document_writes_no_rows_but_other_files_still_run() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = IngestService::new(Arc::clone(&repo));

    let landing = temp_dir.path().join("fetched-files");
    std::fs::create_dir_all(&landing).unwrap();

    write_file(&landing, "plaid_liabilities_good.json", &document_json(&[1]));
    // Missing account_id on the single credit entry
    let bad = document_json(&[0]).replace("account_id", "account");
    write_file(&landing, "plaid_liabilities_bad.json", &bad);
    // Does not match the naming convention at all
    write_file(&landing, "notes.txt", "not a liability file");

    let result = service.import_directory(&landing).unwrap();

    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.files_ingested(), 1);
    assert_eq!(result.files_failed(), 1);

    let bad_outcome = result
        .outcomes
        .iter()
        .find(|o| o.file_name == "plaid_liabilities_bad.json")
        .unwrap();
    assert!(!bad_outcome.succeeded());
    assert!(bad_outcome.error.as_ref().unwrap().contains("Validation"));

    // The failed file left zero rows; only the good file was ingested
    let counts = repo.table_counts().unwrap();
    assert_eq!(counts.imports, 1);
    assert_eq!(counts.liability_accounts, 1);
    assert_eq!(counts.apr_entries, 1);
}

#[test]
fn test_malformed_file_name_is_a_recorded_failure() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = IngestService::new(Arc::clone(&repo));

    let landing = temp_dir.path().join("fetched-files");
    std::fs::create_dir_all(&landing).unwrap();

    // Matches prefix and extension but carries no bank label
    write_file(&landing, "plaid_liabilities_.json", &document_json(&[1]));

    let result = service.import_directory(&landing).unwrap();
    assert_eq!(result.outcomes.len(), 1);
    assert!(!result.outcomes[0].succeeded());
    assert_eq!(repo.table_counts().unwrap().imports, 0);
}

#[test]
fn test_empty_directory_yields_empty_result() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = IngestService::new(repo);

    let landing = temp_dir.path().join("fetched-files");
    std::fs::create_dir_all(&landing).unwrap();

    let result = service.import_directory(&landing).unwrap();
    assert!(result.outcomes.is_empty());
}
