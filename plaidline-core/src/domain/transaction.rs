//! Transaction models for the enrichment path

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A raw transaction row as stored by the upstream statement ingester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub transaction_id: i64,
    /// Payee/description text, taken verbatim for enrichment
    pub payee: String,
    /// Signed amount: negative for money out, non-negative for money in
    pub amount: Decimal,
    pub currency: Option<String>,
}

/// Flow direction derived from the sign of the stored amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Inflow,
    Outflow,
}

/// One transaction normalized for submission to the enrich endpoint
///
/// Amounts are always non-negative on the wire; the sign is carried by
/// `direction`. The currency code is fixed by configuration, not taken
/// from the stored row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientTransaction {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub iso_currency_code: String,
    pub direction: Direction,
}

impl ClientTransaction {
    /// Normalize a stored row for the enrich request
    pub fn from_row(row: &TransactionRow, currency_code: &str) -> Self {
        let direction = if row.amount.is_sign_negative() && !row.amount.is_zero() {
            Direction::Outflow
        } else {
            Direction::Inflow
        };
        Self {
            id: row.transaction_id.to_string(),
            description: row.payee.clone(),
            amount: row.amount.abs(),
            iso_currency_code: currency_code.to_string(),
            direction,
        }
    }
}

/// Merchant and category metadata returned by the enrich endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enrichments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_finance_category: Option<PersonalFinanceCategory>,
}

/// Plaid's two-level category taxonomy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalFinanceCategory {
    pub primary: String,
    pub detailed: String,
}

/// One enriched transaction, echoing the submitted identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedTransaction {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub direction: Direction,
    #[serde(default)]
    pub enrichments: Enrichments,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, amount: &str) -> TransactionRow {
        TransactionRow {
            transaction_id: id,
            payee: "TIM HORTONS #1234".to_string(),
            amount: amount.parse().unwrap(),
            currency: Some("CAD".to_string()),
        }
    }

    #[test]
    fn test_negative_amount_becomes_outflow() {
        let tx = ClientTransaction::from_row(&row(7, "-42.50"), "CAD");
        assert_eq!(tx.direction, Direction::Outflow);
        assert_eq!(tx.amount, "42.50".parse::<Decimal>().unwrap());
        assert_eq!(tx.id, "7");
    }

    #[test]
    fn test_positive_amount_becomes_inflow() {
        let tx = ClientTransaction::from_row(&row(8, "10.00"), "CAD");
        assert_eq!(tx.direction, Direction::Inflow);
        assert_eq!(tx.amount, "10.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_zero_amount_is_inflow() {
        let tx = ClientTransaction::from_row(&row(9, "0"), "CAD");
        assert_eq!(tx.direction, Direction::Inflow);
    }

    #[test]
    fn test_currency_comes_from_config_not_row() {
        let mut r = row(10, "-1.00");
        r.currency = Some("USD".to_string());
        let tx = ClientTransaction::from_row(&r, "CAD");
        assert_eq!(tx.iso_currency_code, "CAD");
    }

    #[test]
    fn test_direction_wire_format_is_uppercase() {
        let json = serde_json::to_string(&Direction::Outflow).unwrap();
        assert_eq!(json, r#""OUTFLOW""#);
    }
}
