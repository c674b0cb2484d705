//! Processing Errors

use crate::domain::DomainError;
use crate::store::StoreError;

/// Outcome classes of a failed `process` call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessError {
    /// Input rejected before touching the store
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// The idempotency key was already applied
    #[error("Transaction with id {0} already exists")]
    AlreadyExists(String),

    /// Store temporarily unavailable; the caller may retry
    #[error("Store unavailable: {0}")]
    Connectivity(String),

    /// Any other store failure
    #[error("Processing failed: {0}")]
    Fatal(String),
}

impl ProcessError {
    /// Only connectivity failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessError::Connectivity(_))
    }

    /// Duplicate delivery of an already-applied event
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ProcessError::AlreadyExists(_))
    }

    /// Map a store failure that happened while handling `id`.
    pub(crate) fn from_store(err: StoreError, id: &str) -> Self {
        match err {
            StoreError::Conflict(_) => ProcessError::AlreadyExists(id.to_string()),
            StoreError::Validation(msg) => {
                ProcessError::Validation(DomainError::ConstraintViolation(msg))
            }
            StoreError::Connectivity(msg) => ProcessError::Connectivity(msg),
            StoreError::Fatal(msg) => ProcessError::Fatal(msg),
        }
    }
}
