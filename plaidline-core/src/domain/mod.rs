//! Core domain entities

pub mod liability;
pub mod result;
pub mod transaction;

pub use liability::{AprDetail, CreditLiability, ImportRecord, LiabilityDocument};
pub use transaction::{
    ClientTransaction, Direction, EnrichedTransaction, Enrichments, PersonalFinanceCategory,
    TransactionRow,
};
