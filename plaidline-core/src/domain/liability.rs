//! Liability document model
//!
//! Mirrors the nested JSON shape Plaid returns for credit liabilities:
//! a `credit` array of accounts, each carrying zero or more APR tiers.
//! All fields listed here are required by the ingestion contract; a
//! document missing any of them fails validation as a whole.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fetched liability document for a single bank capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiabilityDocument {
    pub credit: Vec<CreditLiability>,
}

impl LiabilityDocument {
    /// Count of (credit accounts, APR tiers) in this document
    pub fn line_item_counts(&self) -> (usize, usize) {
        let aprs = self.credit.iter().map(|c| c.aprs.len()).sum();
        (self.credit.len(), aprs)
    }
}

/// One credit account's liability snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditLiability {
    pub account_id: String,
    pub is_overdue: bool,
    pub last_payment_amount: Decimal,
    pub last_payment_date: NaiveDate,
    pub last_statement_issue_date: NaiveDate,
    pub last_statement_balance: Decimal,
    pub minimum_payment_amount: Decimal,
    pub next_payment_due_date: NaiveDate,
    #[serde(default)]
    pub aprs: Vec<AprDetail>,
}

/// One interest-rate tier within a credit account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprDetail {
    pub apr_percentage: Decimal,
    pub apr_type: String,
    pub balance_subject_to_apr: Decimal,
    pub interest_charge_amount: Decimal,
}

/// One row of the append-only import ledger
///
/// Created once per ingested source file, never mutated or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRecord {
    pub id: i64,
    pub file_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
