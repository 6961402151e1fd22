//! Port definitions - trait seams for external collaborators

pub mod enrichment;

pub use enrichment::EnrichmentProvider;
