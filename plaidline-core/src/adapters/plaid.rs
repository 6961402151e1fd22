//! Plaid API client
//!
//! Handles communication with the Plaid `/transactions/enrich` endpoint.
//! Credentials travel in the JSON request body, per Plaid's API convention.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::PlaidConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{ClientTransaction, EnrichedTransaction};
use crate::ports::EnrichmentProvider;

/// Request body for POST /transactions/enrich
#[derive(Debug, Serialize)]
struct TransactionsEnrichRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    account_type: &'a str,
    transactions: &'a [ClientTransaction],
}

/// Response body from /transactions/enrich
#[derive(Debug, Deserialize)]
struct TransactionsEnrichResponse {
    enriched_transactions: Vec<EnrichedTransaction>,
}

/// Plaid API client
#[derive(Debug)]
pub struct PlaidClient {
    client: Client,
    base_url: String,
    client_id: String,
    secret: String,
}

impl PlaidClient {
    /// Create a client for the configured Plaid environment
    pub fn new(config: &PlaidConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::enrichment(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.environment.base_url().to_string(),
            client_id: config.client_id.clone(),
            secret: config.secret.clone(),
        })
    }

    /// Base endpoint this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map transport errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::enrichment("Plaid request timed out after 30 seconds")
        } else if error.is_connect() {
            Error::enrichment("Unable to connect to Plaid servers")
        } else {
            Error::enrichment(format!("Plaid request failed: {}", error))
        }
    }
}

impl EnrichmentProvider for PlaidClient {
    fn name(&self) -> &str {
        "plaid"
    }

    fn enrich_batch(
        &self,
        account_type: &str,
        batch: &[ClientTransaction],
    ) -> Result<Vec<EnrichedTransaction>> {
        let url = format!("{}/transactions/enrich", self.base_url);
        let request = TransactionsEnrichRequest {
            client_id: &self.client_id,
            secret: &self.secret,
            account_type,
            transactions: batch,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::enrichment(format!(
                "Plaid API error: HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let data: TransactionsEnrichResponse = response
            .json()
            .map_err(|e| Error::enrichment(format!("Failed to parse Plaid response: {}", e)))?;

        // The endpoint echoes one element per submitted transaction, in
        // order. Anything else means the response cannot be trusted.
        if data.enriched_transactions.len() != batch.len() {
            return Err(Error::enrichment(format!(
                "Plaid returned {} enriched transactions for a batch of {}",
                data.enriched_transactions.len(),
                batch.len()
            )));
        }

        Ok(data.enriched_transactions)
    }
}
