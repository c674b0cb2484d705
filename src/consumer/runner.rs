//! Message consumer loop
//!
//! One message in flight at a time. Connectivity failures are retried
//! with a fixed delay; every other outcome is final and the message is
//! committed exactly once. Shutdown is checked before each receive and
//! during each retry delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::logging::{AsyncLogger, LogFields};
use crate::processor::{CreateTransactionCommand, ProcessError, TransactionProcessor};

use super::{MessageSource, ReceivedMessage, SourceError, TransactionMessage};

// =========================================================================
// Retry policy
// =========================================================================

/// Bounded, fixed-delay retry for connectivity failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of `process` calls per message, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(3))
    }
}

// =========================================================================
// State & outcomes
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Running,
    Stopping,
    Stopped,
}

/// How a single received message ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Stored,
    /// Idempotency key already applied
    Duplicate,
    /// Failed validation
    Rejected,
    /// Payload could not be decoded
    Malformed,
    RetriesExhausted,
    /// Non-retryable store failure
    Failed,
    /// Shutdown arrived between retry attempts
    Interrupted,
}

impl ProcessingOutcome {
    /// Whether the message should be committed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessingOutcome::Interrupted)
    }
}

// =========================================================================
// Consumer
// =========================================================================

pub struct MessageConsumer {
    source: Arc<dyn MessageSource>,
    processor: TransactionProcessor,
    logger: AsyncLogger,
    retry: RetryPolicy,
    state: watch::Sender<ConsumerState>,
    closed: AtomicBool,
}

impl MessageConsumer {
    pub fn new(
        source: Arc<dyn MessageSource>,
        processor: TransactionProcessor,
        logger: AsyncLogger,
    ) -> Self {
        let (state, _) = watch::channel(ConsumerState::Stopped);
        Self {
            source,
            processor,
            logger,
            retry: RetryPolicy::default(),
            state,
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> ConsumerState {
        *self.state.borrow()
    }

    /// Run the loop on a background task until `shutdown` turns true
    pub fn start(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    /// Consume until shutdown is signalled or the source closes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        self.state.send_replace(ConsumerState::Running);
        self.logger.info("Message consumer started", vec![]).await;

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    self.state.send_replace(ConsumerState::Stopping);
                    break;
                }
                received = self.source.recv() => received,
            };

            let message = match received {
                Ok(message) => message,
                Err(SourceError::Closed) => {
                    self.state.send_replace(ConsumerState::Stopping);
                    self.logger.warn("Message source closed", vec![]).await;
                    break;
                }
                Err(e) => {
                    self.logger
                        .error("Failed to read message", vec![("error", e.to_string())])
                        .await;
                    continue;
                }
            };

            let outcome = self.handle_message(&message, &mut shutdown).await;
            if !outcome.is_terminal() {
                // Left uncommitted so the broker redelivers it.
                break;
            }
            self.acknowledge(&message).await;
        }

        self.state.send_replace(ConsumerState::Stopped);
        self.logger.info("Message consumer stopped", vec![]).await;
    }

    /// Decode and process one message, retrying connectivity failures.
    ///
    /// Does not commit; the caller commits when the outcome is terminal.
    pub async fn handle_message(
        &self,
        message: &ReceivedMessage,
        shutdown: &mut watch::Receiver<bool>,
    ) -> ProcessingOutcome {
        let decoded: TransactionMessage = match serde_json::from_slice(&message.payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                let mut fields = position(message);
                fields.push(("error", e.to_string()));
                self.logger.error("Failed to decode message", fields).await;
                return ProcessingOutcome::Malformed;
            }
        };

        let command = CreateTransactionCommand::from(decoded);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.processor.process(command.clone()).await {
                Ok(transaction) => {
                    self.logger
                        .info(
                            "Transaction stored",
                            vec![
                                ("id", transaction.id),
                                ("user_id", transaction.user_id),
                                ("transaction_type", transaction.transaction_type.to_string()),
                                ("amount", transaction.amount.to_string()),
                            ],
                        )
                        .await;
                    return ProcessingOutcome::Stored;
                }
                Err(e) if e.is_already_exists() => {
                    self.logger
                        .info("Duplicate transaction skipped", context(&command, message))
                        .await;
                    return ProcessingOutcome::Duplicate;
                }
                Err(e) if e.is_retryable() => {
                    let mut fields = context(&command, message);
                    fields.push(("attempt", attempt.to_string()));
                    fields.push(("error", e.to_string()));

                    if attempt >= self.retry.max_attempts {
                        self.logger
                            .error("Giving up on transaction after retries", fields)
                            .await;
                        return ProcessingOutcome::RetriesExhausted;
                    }

                    self.logger.warn("Store unavailable, retrying", fields).await;

                    tokio::select! {
                        biased;
                        _ = shutdown_requested(shutdown) => {
                            self.state.send_replace(ConsumerState::Stopping);
                            self.logger
                                .warn("Retry interrupted by shutdown", context(&command, message))
                                .await;
                            return ProcessingOutcome::Interrupted;
                        }
                        _ = tokio::time::sleep(self.retry.delay) => {}
                    }
                }
                Err(e @ ProcessError::Validation(_)) => {
                    let mut fields = context(&command, message);
                    fields.push(("error", e.to_string()));
                    self.logger.error("Transaction rejected", fields).await;
                    return ProcessingOutcome::Rejected;
                }
                Err(e) => {
                    let mut fields = context(&command, message);
                    fields.push(("error", e.to_string()));
                    self.logger.error("Failed to process transaction", fields).await;
                    return ProcessingOutcome::Failed;
                }
            }
        }
    }

    async fn acknowledge(&self, message: &ReceivedMessage) {
        if let Err(e) = self.source.commit(message).await {
            let mut fields = position(message);
            fields.push(("error", e.to_string()));
            self.logger.error("Failed to commit message", fields).await;
        }
    }

    /// Release the broker connection. Safe to call more than once.
    pub fn close(&self) -> Result<(), SourceError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.source.close()
    }
}

/// Resolves once shutdown is requested or the signal sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

fn position(message: &ReceivedMessage) -> LogFields {
    vec![
        ("topic", message.topic.clone()),
        ("partition", message.partition.to_string()),
        ("offset", message.offset.to_string()),
    ]
}

fn context(command: &CreateTransactionCommand, message: &ReceivedMessage) -> LogFields {
    let mut fields = position(message);
    fields.push(("id", command.idempotency_key().unwrap_or("-").to_string()));
    fields.push(("user_id", command.user_id.clone()));
    fields.push(("transaction_type", command.transaction_type.clone()));
    fields
}

// =========================================================================
// Tests
// =========================================================================
