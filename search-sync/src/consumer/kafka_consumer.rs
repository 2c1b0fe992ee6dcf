//! Kafka consumer implementation for change events.
//!
//! The marketplace backend publishes one JSON change envelope per document
//! mutation to the changes topic; this consumer batches them and forwards
//! them to the orchestrator.

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    message::Message as KafkaMessage,
    TopicPartitionList,
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::messages::{ChangeEnvelope, ChangeEvent, StreamMessage};
use crate::consumer::ChangeConsumer;
use crate::errors::SyncError;

/// The Kafka topic carrying document change envelopes.
const CHANGES_TOPIC: &str = "marketplace.changes";

/// Default batch size for Kafka message batching.
const DEFAULT_BATCH_SIZE: usize = 50;

/// Default batch timeout in milliseconds.
const DEFAULT_BATCH_TIMEOUT_MS: u64 = 1000;

/// Kafka consumer for document change events.
pub struct KafkaChangeConsumer {
    consumer: StreamConsumer,
    topics: Vec<String>,
    batch_size: usize,
    batch_timeout: Duration,
}

impl KafkaChangeConsumer {
    /// Create a new Kafka consumer.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, SyncError> {
        Self::with_batch_config(
            brokers,
            group_id,
            DEFAULT_BATCH_SIZE,
            DEFAULT_BATCH_TIMEOUT_MS,
        )
    }

    /// Create a new Kafka consumer with custom batch configuration.
    pub fn with_batch_config(
        brokers: &str,
        group_id: &str,
        batch_size: usize,
        batch_timeout_ms: u64,
    ) -> Result<Self, SyncError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| SyncError::kafka(e.to_string()))?;

        info!(
            brokers = %brokers,
            group_id = %group_id,
            batch_size = batch_size,
            batch_timeout_ms = batch_timeout_ms,
            "Created Kafka change consumer"
        );

        Ok(Self {
            consumer,
            topics: vec![CHANGES_TOPIC.to_string()],
            batch_size,
            batch_timeout: Duration::from_millis(batch_timeout_ms),
        })
    }

    /// Decode one Kafka message into a change event.
    ///
    /// An empty payload (e.g. a compaction tombstone) yields `None`.
    fn parse_message(payload: Option<&[u8]>) -> Result<Option<ChangeEvent>, SyncError> {
        let Some(payload) = payload else {
            return Ok(None);
        };
        if payload.is_empty() {
            return Ok(None);
        }

        let envelope: ChangeEnvelope = serde_json::from_slice(payload)
            .map_err(|e| SyncError::parse(format!("invalid change envelope: {e}")))?;
        ChangeEvent::from_envelope(envelope).map(Some)
    }

    /// Flush a batch of change events to the orchestrator channel.
    async fn flush_batch(
        &self,
        batch: &[ChangeEvent],
        offsets: &[(String, i32, i64)],
        sender: &mpsc::Sender<StreamMessage>,
    ) -> Result<(), SyncError> {
        if batch.is_empty() {
            return Ok(());
        }

        debug!(
            event_count = batch.len(),
            offset_count = offsets.len(),
            "Sending batch of change events to processor"
        );
        sender
            .send(StreamMessage::Events {
                events: batch.to_vec(),
                offsets: offsets.to_vec(),
            })
            .await
            .map_err(|e| SyncError::ChannelError(e.to_string()))
    }

    /// Commit offsets for a batch of messages.
    async fn commit_offsets(&self, offsets: &[(String, i32, i64)]) -> Result<(), SyncError> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut tpl = TopicPartitionList::new();
        for (topic, partition, offset) in offsets {
            tpl.add_partition_offset(topic, *partition, rdkafka::Offset::Offset(offset + 1))
                .map_err(|e| SyncError::kafka(e.to_string()))?;
        }
        self.consumer
            .commit(&tpl, rdkafka::consumer::CommitMode::Async)
            .map_err(|e| SyncError::kafka(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ChangeConsumer for KafkaChangeConsumer {
    /// Subscribe to the changes topic.
    fn subscribe(&self) -> Result<(), SyncError> {
        let topics: Vec<&str> = self.topics.iter().map(|s| s.as_str()).collect();
        self.consumer
            .subscribe(&topics)
            .map_err(|e| SyncError::kafka(e.to_string()))?;

        info!(topics = ?self.topics, "Subscribed to Kafka topics");
        Ok(())
    }

    /// Start consuming messages and send them through the channel.
    ///
    /// Messages are batched before being sent. Offsets are committed once the
    /// orchestrator acknowledges a batch, whether or not processing
    /// succeeded: a failed change event is logged and dropped rather than
    /// redelivered forever.
    #[instrument(skip(self, sender, ack_receiver, shutdown))]
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), SyncError> {
        use futures::StreamExt;

        let mut message_stream = self.consumer.stream();
        let mut batch: Vec<ChangeEvent> = Vec::with_capacity(self.batch_size);
        let mut pending_offsets: Vec<(String, i32, i64)> = Vec::new();
        let mut flush_timer = tokio::time::interval(self.batch_timeout);
        flush_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Skip the first tick immediately
        flush_timer.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    // Pending messages are not flushed; they haven't been
                    // committed and will be re-read on restart.
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
                ack_msg = ack_receiver.recv() => {
                    match ack_msg {
                        Some(StreamMessage::Acknowledgment { offsets, success, error }) => {
                            if !success {
                                error!(
                                    offset_count = offsets.len(),
                                    error = error.as_deref().unwrap_or("Unknown error"),
                                    "Processing failed; dropping change events"
                                );
                            }
                            // Commit either way: failed change events are
                            // dropped, not redelivered.
                            if let Err(e) = self.commit_offsets(&offsets).await {
                                error!(error = %e, "Failed to commit offsets after acknowledgment");
                            } else {
                                debug!(offset_count = offsets.len(), "Committed offsets");
                            }
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Acknowledgment channel closed");
                            break;
                        }
                        _ => {
                            // Ignore other message types
                        }
                    }
                }
                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            debug!(
                                topic = %msg.topic(),
                                partition = msg.partition(),
                                offset = msg.offset(),
                                "Received message from Kafka"
                            );
                            match Self::parse_message(msg.payload()) {
                                Ok(Some(event)) => {
                                    batch.push(event);
                                    pending_offsets.push((msg.topic().to_string(), msg.partition(), msg.offset()));

                                    if batch.len() >= self.batch_size {
                                        let offsets_to_send = pending_offsets.clone();
                                        self.flush_batch(&batch, &offsets_to_send, &sender).await?;
                                        batch.clear();
                                        pending_offsets.clear();
                                    }
                                }
                                Ok(None) => {
                                    // No event in this message; commit it
                                    // immediately so it is not re-read on
                                    // restart.
                                    let mut tpl = TopicPartitionList::new();
                                    tpl.add_partition_offset(
                                        msg.topic(),
                                        msg.partition(),
                                        rdkafka::Offset::Offset(msg.offset() + 1)
                                    )
                                    .map_err(|e| SyncError::kafka(e.to_string()))?;
                                    self.consumer
                                        .commit(&tpl, rdkafka::consumer::CommitMode::Async)
                                        .map_err(|e| SyncError::kafka(e.to_string()))?;
                                }
                                Err(e) => {
                                    warn!(
                                        topic = %msg.topic(),
                                        partition = msg.partition(),
                                        offset = msg.offset(),
                                        error = %e,
                                        "Failed to parse change envelope; dropping message"
                                    );
                                }
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka error");
                            let _ = sender.send(StreamMessage::Error(e.to_string())).await;
                        }
                        None => {
                            info!("Kafka stream ended");
                            if !batch.is_empty() {
                                let offsets_to_send = pending_offsets.clone();
                                self.flush_batch(&batch, &offsets_to_send, &sender).await?;
                            }
                            let _ = sender.send(StreamMessage::End).await;
                            break;
                        }
                    }
                }
                _ = flush_timer.tick() => {
                    if !batch.is_empty() {
                        debug!(count = batch.len(), "Flushing batch due to timeout");
                        let offsets_to_send = pending_offsets.clone();
                        self.flush_batch(&batch, &offsets_to_send, &sender).await?;
                        batch.clear();
                        pending_offsets.clear();
                    }
                }
            }
        }

        Ok(())
    }
}
