//! Kafka-backed [`MessageSource`]

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};

use super::{MessageSource, ReceivedMessage, SourceError};

/// Consumer-group member subscribed to a single topic.
///
/// Offsets are committed manually, one message at a time.
pub struct KafkaMessageSource {
    consumer: StreamConsumer,
    topic: String,
    closed: AtomicBool,
}

impl KafkaMessageSource {
    pub fn connect(brokers: &str, group_id: &str, topic: &str) -> Result<Self, SourceError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| SourceError::Connection(format!("failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| SourceError::Connection(format!("failed to subscribe to {topic}: {e}")))?;

        tracing::info!(
            brokers = %brokers,
            group_id = %group_id,
            topic = %topic,
            manual_commit = true,
            "Subscribed to topic"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl MessageSource for KafkaMessageSource {
    async fn recv(&self) -> Result<ReceivedMessage, SourceError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SourceError::Closed);
        }

        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| SourceError::Receive(e.to_string()))?;

        Ok(ReceivedMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        })
    }

    async fn commit(&self, message: &ReceivedMessage) -> Result<(), SourceError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SourceError::Closed);
        }

        // Committed offset is the next one to read.
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&message.topic, message.partition, Offset::Offset(message.offset + 1))
            .map_err(|e| SourceError::Commit(e.to_string()))?;

        self.consumer
            .commit(&offsets, CommitMode::Async)
            .map_err(|e| SourceError::Commit(e.to_string()))
    }

    fn close(&self) -> Result<(), SourceError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.consumer.unsubscribe();
        tracing::info!(topic = %self.topic, "Kafka consumer closed");
        Ok(())
    }
}
