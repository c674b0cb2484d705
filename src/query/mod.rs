//! Query Service
//!
//! Read access to stored transactions. Results come back exactly as the
//! store returns them: most recent first.

use std::sync::Arc;

use crate::domain::{Transaction, TransactionFilter};
use crate::store::{StoreError, TransactionStore};

/// Read-side service over a [`TransactionStore`]
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn TransactionStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// Transactions belonging to `user_id`, optionally narrowed by type
    pub async fn list_for_user(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.store.get_by_user(user_id, filter).await
    }

    /// Every transaction, optionally narrowed by type
    pub async fn list_all(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        self.store.get_all(filter).await
    }
}
