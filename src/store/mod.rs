//! Transaction Store
//!
//! Persistence contract for transaction records. The store owns the
//! uniqueness guarantee on `id` and the filter/ordering semantics shared by
//! the ingestion and query paths.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::{Transaction, TransactionFilter};

pub use error::StoreError;
pub use memory::InMemoryTransactionStore;
pub use postgres::PgTransactionStore;

/// Storage backend for transactions.
///
/// Implementations must enforce `id` uniqueness atomically at write time and
/// return query results ordered by `timestamp` descending (ties broken by
/// `id` ascending).
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a new record.
    ///
    /// Fails with `Conflict` if the id already exists, `Validation` if the
    /// record breaks a storage constraint, `Connectivity` on transient
    /// backend failure.
    async fn save(&self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Look a record up by id; absence is not an error.
    async fn get_by_id(&self, id: &str) -> Result<Option<Transaction>, StoreError>;

    /// Records for one user, most recent first.
    async fn get_by_user(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// All records, most recent first.
    async fn get_all(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError>;
}
