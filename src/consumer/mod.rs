//! Broker ingestion
//!
//! Pulls transaction events off a topic, feeds them to the
//! [`TransactionProcessor`](crate::processor::TransactionProcessor) one at a
//! time and acknowledges them once the outcome is final.

mod kafka;
mod runner;

pub use kafka::KafkaMessageSource;
pub use runner::{ConsumerState, MessageConsumer, ProcessingOutcome, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::processor::{normalize_id, CreateTransactionCommand};

// =========================================================================
// Source abstraction
// =========================================================================

/// A message detached from the broker client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Raw body; empty when the broker delivered none
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("Broker connection failed: {0}")]
    Connection(String),

    #[error("Failed to receive message: {0}")]
    Receive(String),

    #[error("Failed to commit offset: {0}")]
    Commit(String),

    #[error("Message source is closed")]
    Closed,
}

/// Pull-based message source with explicit acknowledgement
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for the next message. Must be safe to drop mid-wait.
    async fn recv(&self) -> Result<ReceivedMessage, SourceError>;

    /// Mark `message` as processed so it is not redelivered
    async fn commit(&self, message: &ReceivedMessage) -> Result<(), SourceError>;

    /// Release the broker connection. Idempotent.
    fn close(&self) -> Result<(), SourceError>;
}

// =========================================================================
// Wire format
// =========================================================================

/// JSON body of a transaction event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub transaction_type: String,
    pub amount: u64,
}

impl From<TransactionMessage> for CreateTransactionCommand {
    fn from(message: TransactionMessage) -> Self {
        CreateTransactionCommand {
            id: normalize_id(message.id),
            user_id: message.user_id,
            transaction_type: message.transaction_type,
            amount: message.amount,
        }
    }
}
