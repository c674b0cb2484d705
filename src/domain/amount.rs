//! Amount type
//!
//! Domain primitive for wager/payout amounts with business rule validation.
//! Amounts are whole units and are validated at construction time, so an
//! invalid value cannot reach the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest amount the `transactions.amount BIGINT` column can hold.
const MAX_AMOUNT: u64 = i64::MAX as u64;

/// Amount represents a validated transaction amount.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Value fits a signed 64-bit column
///
/// # Example
/// ```
/// use casino_transactions::domain::Amount;
///
/// let amount = Amount::new(100).unwrap();
/// assert_eq!(amount.value(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Amount(u64);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be greater than zero")]
    NotPositive,

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT}, got {0})")]
    Overflow(u64),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value == 0
    /// - `AmountError::Overflow` if value does not fit the storage column
    pub fn new(value: u64) -> Result<Self, AmountError> {
        if value == 0 {
            return Err(AmountError::NotPositive);
        }

        if value > MAX_AMOUNT {
            return Err(AmountError::Overflow(value));
        }

        Ok(Self(value))
    }

    /// Get the underlying value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Value as stored in Postgres.
    pub fn as_i64(&self) -> i64 {
        // Bounded by MAX_AMOUNT at construction.
        self.0 as i64
    }

    /// Rebuild an amount read back from a signed column.
    pub fn from_i64(value: i64) -> Result<Self, AmountError> {
        if value <= 0 {
            return Err(AmountError::NotPositive);
        }
        Self::new(value as u64)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Amount {
    type Error = AmountError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
