//! Command definitions
//!
//! A request to record a transaction, from either the broker or a direct
//! creation call.

use serde::{Deserialize, Serialize};

/// Command to create a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionCommand {
    /// Idempotency key; a fresh id is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    /// Raw type, validated by the processor
    pub transaction_type: String,
    pub amount: u64,
}

impl CreateTransactionCommand {
    pub fn new(user_id: impl Into<String>, transaction_type: impl Into<String>, amount: u64) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            transaction_type: transaction_type.into(),
            amount,
        }
    }

    /// Attach an idempotency key. Blank ids count as absent.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = normalize_id(Some(id.into()));
        self
    }

    /// The idempotency key, if one was supplied
    pub fn idempotency_key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Treat empty or whitespace-only ids as missing.
pub(crate) fn normalize_id(id: Option<String>) -> Option<String> {
    id.filter(|id| !id.trim().is_empty())
}
