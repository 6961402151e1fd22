//! Enrichment provider port
//!
//! Defines the interface for the external batched-enrichment capability.
//! The enrich service drives this trait without knowing transport details,
//! which also gives tests a seam for failure injection.

use crate::domain::result::Result;
use crate::domain::{ClientTransaction, EnrichedTransaction};

/// External transaction-enrichment capability
pub trait EnrichmentProvider: Send + Sync {
    /// Provider name (e.g. "plaid")
    fn name(&self) -> &str;

    /// Submit one batch and return one enrichment record per submitted
    /// transaction, order-preserving within the batch.
    fn enrich_batch(
        &self,
        account_type: &str,
        batch: &[ClientTransaction],
    ) -> Result<Vec<EnrichedTransaction>>;
}
