//! Transaction Processor
//!
//! The only write path into the store. Validates a creation command and
//! persists it at most once per idempotency key.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Amount, DomainError, Transaction, TransactionType};
use crate::store::{StoreError, TransactionStore};

use super::{CreateTransactionCommand, ProcessError};

/// Validates and idempotently persists creation commands.
///
/// Stateless per call: no retries happen here, retry orchestration belongs
/// to the caller (see [`ProcessError::is_retryable`]).
#[derive(Clone)]
pub struct TransactionProcessor {
    store: Arc<dyn TransactionStore>,
}

impl TransactionProcessor {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    /// Process a creation command.
    ///
    /// 1. Validate type, amount and user (no store access on failure).
    /// 2. If an id is supplied, look it up; an existing record yields
    ///    `AlreadyExists`.
    /// 3. Build the record (fresh UUID when no id) stamped with the current time.
    /// 4. Save it; a `Conflict` from the store also yields `AlreadyExists`.
    pub async fn process(
        &self,
        command: CreateTransactionCommand,
    ) -> Result<Transaction, ProcessError> {
        let (user_id, transaction_type, amount) = Self::validate(&command)?;

        if let Some(id) = command.idempotency_key() {
            match self.store.get_by_id(id).await {
                Ok(Some(_)) => return Err(ProcessError::AlreadyExists(id.to_string())),
                Ok(None) => {}
                Err(e @ StoreError::Connectivity(_)) => {
                    return Err(ProcessError::from_store(e, id));
                }
                Err(e) => {
                    return Err(ProcessError::Fatal(format!(
                        "failed to check for existing transaction {}: {}",
                        id, e
                    )));
                }
            }
        }

        let id = command
            .idempotency_key()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let transaction = Transaction::new(id, user_id, transaction_type, amount);

        self.store
            .save(&transaction)
            .await
            .map_err(|e| ProcessError::from_store(e, &transaction.id))?;

        Ok(transaction)
    }

    /// Returns the trimmed user id; queries match it exactly.
    fn validate(
        command: &CreateTransactionCommand,
    ) -> Result<(String, TransactionType, Amount), DomainError> {
        let user_id = command.user_id.trim();
        if user_id.is_empty() {
            return Err(DomainError::MissingUserId);
        }
        let transaction_type: TransactionType = command.transaction_type.parse()?;
        let amount = Amount::new(command.amount)?;
        Ok((user_id.to_string(), transaction_type, amount))
    }
}
