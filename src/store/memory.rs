//! In-memory Transaction Store
//!
//! Honours the full [`TransactionStore`] contract without a database. Used by
//! tests and by `STORAGE_BACKEND=memory` for local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Transaction, TransactionFilter};

use super::{StoreError, TransactionStore};

/// Transaction store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    records: RwLock<HashMap<String, Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn sorted(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
        transactions.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });
        transactions
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn save(&self, transaction: &Transaction) -> Result<(), StoreError> {
        // Mirrors the NOT NULL/CHECK constraints of the SQL schema.
        if transaction.id.trim().is_empty() {
            return Err(StoreError::Validation("id must not be empty".to_string()));
        }
        if transaction.user_id.trim().is_empty() {
            return Err(StoreError::Validation("user_id must not be empty".to_string()));
        }

        let mut records = self.records.write().await;
        if records.contains_key(&transaction.id) {
            return Err(StoreError::Conflict(transaction.id.clone()));
        }
        records.insert(transaction.id.clone(), transaction.clone());

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn get_by_user(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        let records = self.records.read().await;
        let matching = records
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect();

        Ok(Self::sorted(matching))
    }

    async fn get_all(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        let records = self.records.read().await;
        let matching = records.values().filter(|t| filter.matches(t)).cloned().collect();

        Ok(Self::sorted(matching))
    }
}
