//! Store Errors
//!
//! Classification of storage failures. Every backend maps its native errors
//! into one of these variants, so callers never inspect error text.

/// Errors that can occur in the transaction store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness constraint on `id` rejected the write
    #[error("Transaction already stored: {0}")]
    Conflict(String),

    /// Record violates a storage-level constraint
    #[error("Constraint violation: {0}")]
    Validation(String),

    /// Backend unreachable or temporarily unavailable
    #[error("Storage unavailable: {0}")]
    Connectivity(String),

    /// Anything else
    #[error("Storage failure: {0}")]
    Fatal(String),
}

impl StoreError {
    /// Check if this error is a uniqueness conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    /// Check if this error is transient
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }

    /// Classify a Postgres SQLSTATE code.
    pub fn from_sqlstate(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            // unique_violation
            "23505" => StoreError::Conflict(message),
            // check_violation, not_null_violation, invalid_text_representation, numeric_value_out_of_range
            "23514" | "23502" | "22P02" | "22003" => StoreError::Validation(message),
            // admin_shutdown, crash_shutdown, cannot_connect_now, too_many_connections
            "57P01" | "57P02" | "57P03" | "53300" => StoreError::Connectivity(message),
            // connection_exception class
            c if c.starts_with("08") => StoreError::Connectivity(message),
            _ => StoreError::Fatal(message),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code() {
                    Some(code) => StoreError::from_sqlstate(&code, message),
                    None => StoreError::Fatal(message),
                }
            }
            sqlx::Error::Io(e) => StoreError::Connectivity(e.to_string()),
            sqlx::Error::Tls(e) => StoreError::Connectivity(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Connectivity("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                StoreError::Connectivity("connection pool closed".to_string())
            }
            sqlx::Error::WorkerCrashed => {
                StoreError::Connectivity("connection worker crashed".to_string())
            }
            other => StoreError::Fatal(other.to_string()),
        }
    }
}
