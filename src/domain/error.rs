//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

use super::amount::AmountError;

/// Validation failures for inbound transaction data.
///
/// These errors are never retried: malformed input cannot become
/// well-formed by trying again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Amount is zero or does not fit storage
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Transaction type outside {bet, win}
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// User identifier missing or blank
    #[error("User id is required")]
    MissingUserId,

    /// Rejected by a storage-level constraint
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl DomainError {
    /// Create an invalid transaction type error
    pub fn invalid_type(value: impl Into<String>) -> Self {
        Self::InvalidTransactionType(value.into())
    }
}
