//! Adapters - concrete implementations of external collaborators
//!
//! - `duckdb`: relational store
//! - `plaid`: enrichment endpoint client

pub mod duckdb;
pub mod plaid;

pub use duckdb::DuckDbRepository;
pub use plaid::PlaidClient;
