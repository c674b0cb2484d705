//! Domain module
//!
//! Core domain types and validation rules.

pub mod amount;
pub mod error;
pub mod transaction;

pub use amount::{Amount, AmountError};
pub use error::DomainError;
pub use transaction::{Transaction, TransactionFilter, TransactionType};
