//! DuckDB repository implementation
//!
//! All relational access goes through this adapter. Each method checks the
//! shared connection out for the duration of one unit of work; the lock is
//! released when the guard drops, so a failure mid-operation never leaks a
//! held connection.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{AprDetail, CreditLiability, ImportRecord, TransactionRow};
use crate::services::MigrationService;

/// Maximum number of retries when the database file is locked
const MAX_OPEN_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an open error indicates a transient file lock worth retrying
fn is_lock_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Row counts per pipeline table, for the status command
#[derive(Debug, Clone, serde::Serialize)]
pub struct TableCounts {
    pub imports: i64,
    pub liability_accounts: i64,
    pub apr_entries: i64,
    pub transactions: i64,
}

/// DuckDB repository
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the database at the given path
    ///
    /// Retries with exponential backoff when another process briefly holds
    /// the file lock; any other open failure aborts immediately.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_OPEN_RETRIES {
            match Connection::open(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let msg = e.to_string();
                    if is_lock_error(&msg) && attempt < MAX_OPEN_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            "database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_OPEN_RETRIES,
                            msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Into::into).unwrap_or_else(|| {
            Error::database(format!(
                "failed to open database after {} retries",
                MAX_OPEN_RETRIES
            ))
        }))
    }

    /// Path of the underlying database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        MigrationService::new(&conn).run_pending()?;
        Ok(())
    }

    // === Import ledger ===

    /// Append one row to the import ledger and return its generated id
    ///
    /// No dedup check is performed here: reprocessing a file name creates a
    /// second, independent ledger row.
    pub fn record_import(&self, file_name: &str, description: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        Self::insert_import(&conn, file_name, description)
    }

    fn insert_import(conn: &Connection, file_name: &str, description: &str) -> Result<i64> {
        let id = conn.query_row(
            "INSERT INTO file_import_tracker (file_name, description)
             VALUES (?, ?) RETURNING id",
            params![file_name, description],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// All ledger rows, oldest first
    pub fn get_import_records(&self) -> Result<Vec<ImportRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, file_name, description, created_at::VARCHAR
             FROM file_import_tracker ORDER BY id",
        )?;

        let records = stmt
            .query_map([], |row| {
                let created_str: String = row.get(3)?;
                Ok(ImportRecord {
                    id: row.get(0)?,
                    file_name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: parse_timestamp(&created_str),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(records)
    }

    // === Liability ingestion ===

    /// Insert one document's ledger row and all of its line items in a
    /// single transaction
    ///
    /// Any failure mid-document rolls the whole document back (the
    /// transaction is dropped without commit), so a file is either fully
    /// ingested or leaves no rows at all.
    pub fn ingest_liabilities(
        &self,
        file_name: &str,
        description: &str,
        accounts: &[CreditLiability],
    ) -> Result<(i64, usize, usize)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(Error::from)?;

        let import_id = Self::insert_import(&tx, file_name, description)?;

        let mut apr_rows = 0usize;
        for account in accounts {
            Self::insert_liability_account(&tx, account, import_id)?;
            for apr in &account.aprs {
                Self::insert_apr_entry(&tx, &account.account_id, apr, import_id)?;
                apr_rows += 1;
            }
        }

        tx.commit().map_err(Error::from)?;
        Ok((import_id, accounts.len(), apr_rows))
    }

    fn insert_liability_account(
        conn: &Connection,
        account: &CreditLiability,
        import_id: i64,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO plaid_liabilities_credit (
                account_id, is_overdue, last_payment_amount, last_payment_date,
                last_statement_issue_date, last_statement_balance,
                minimum_payment_amount, next_payment_due_date, file_import_id
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                account.account_id,
                account.is_overdue,
                decimal_to_f64(account.last_payment_amount),
                account.last_payment_date.to_string(),
                account.last_statement_issue_date.to_string(),
                decimal_to_f64(account.last_statement_balance),
                decimal_to_f64(account.minimum_payment_amount),
                account.next_payment_due_date.to_string(),
                import_id,
            ],
        )?;
        Ok(())
    }

    fn insert_apr_entry(
        conn: &Connection,
        account_id: &str,
        apr: &AprDetail,
        import_id: i64,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO plaid_liabilities_credit_apr (
                account_id, apr_percentage, apr_type,
                balance_subject_to_apr, interest_charge_amount, file_import_id
             ) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                account_id,
                decimal_to_f64(apr.apr_percentage),
                apr.apr_type,
                decimal_to_f64(apr.balance_subject_to_apr),
                decimal_to_f64(apr.interest_charge_amount),
                import_id,
            ],
        )?;
        Ok(())
    }

    /// Count of liability account rows tagged with the given import id
    pub fn count_accounts_for_import(&self, import_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM plaid_liabilities_credit WHERE file_import_id = ?",
            params![import_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count of APR rows tagged with the given import id
    pub fn count_aprs_for_import(&self, import_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM plaid_liabilities_credit_apr WHERE file_import_id = ?",
            params![import_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === Transactions (enrichment source) ===

    /// All raw statement transactions, in insertion order
    pub fn get_transactions(&self) -> Result<Vec<TransactionRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT transaction_id, payee, amount, currency
             FROM mbna_transactions ORDER BY transaction_id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let amount: f64 = row.get(2)?;
                Ok(TransactionRow {
                    transaction_id: row.get(0)?,
                    payee: row.get(1)?,
                    amount: Decimal::try_from(amount).unwrap_or_default(),
                    currency: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    /// Insert a raw statement transaction and return its generated id
    ///
    /// The statement ingester that populates mbna_transactions lives
    /// outside this pipeline; this method exists for seeding and tests.
    pub fn add_transaction(
        &self,
        payee: &str,
        amount: Decimal,
        currency: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let id = conn.query_row(
            "INSERT INTO mbna_transactions (payee, amount, currency)
             VALUES (?, ?, ?) RETURNING transaction_id",
            params![payee, decimal_to_f64(amount), currency],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // === Status ===

    /// Row counts across the pipeline tables
    pub fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.conn.lock().unwrap();
        let count = |table: &str| -> Result<i64> {
            let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(n)
        };

        Ok(TableCounts {
            imports: count("file_import_tracker")?,
            liability_accounts: count("plaid_liabilities_credit")?,
            apr_entries: count("plaid_liabilities_credit_apr")?,
            transactions: count("mbna_transactions")?,
        })
    }
}

/// Bind helper: DuckDB's Rust binding has no native Decimal support, so
/// amounts go over the wire as f64 and DECIMAL columns round them back.
fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_string().parse::<f64>().unwrap_or(0.0)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .unwrap_or_else(|_| Utc::now())
}
