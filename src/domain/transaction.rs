//! Transaction record
//!
//! The durable wager/payout record and the read-time filter applied to it.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Amount, DomainError};

/// Kind of casino transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Bet,
    Win,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Bet => "bet",
            TransactionType::Win => "win",
        }
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bet" => Ok(TransactionType::Bet),
            "win" => Ok(TransactionType::Win),
            other => Err(DomainError::invalid_type(other)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted transaction. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique id, doubles as the idempotency key for broker events
    pub id: String,
    pub user_id: String,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    /// When the processor accepted the transaction
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build a transaction accepted now.
    ///
    /// The timestamp is truncated to microseconds, the precision Postgres keeps.
    pub fn new(
        id: String,
        user_id: String,
        transaction_type: TransactionType,
        amount: Amount,
    ) -> Self {
        Self {
            id,
            user_id,
            transaction_type,
            amount,
            timestamp: Utc::now().trunc_subsecs(6),
        }
    }
}

/// Optional read-time predicate; the default matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    /// Filter matching every transaction
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter narrowed to one transaction type
    pub fn of_type(transaction_type: TransactionType) -> Self {
        Self {
            transaction_type: Some(transaction_type),
        }
    }

    /// Check whether a transaction passes the filter
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.transaction_type
            .map_or(true, |t| t == transaction.transaction_type)
    }
}
