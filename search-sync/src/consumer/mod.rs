//! Change-event intake for the sync pipeline.
//!
//! Defines the consumer abstraction the orchestrator runs against, plus the
//! Kafka implementation used in production.

mod kafka_consumer;
mod messages;

pub use kafka_consumer::KafkaChangeConsumer;
pub use messages::{ChangeEnvelope, ChangeEvent, ChangeKind, StreamMessage};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::errors::SyncError;

/// Source of change events.
///
/// Implementations push batches of `StreamMessage::Events` into the sender
/// and receive `StreamMessage::Acknowledgment` back once the orchestrator has
/// attempted to process them. The trait exists so tests can drive the
/// orchestrator without a broker.
#[async_trait]
pub trait ChangeConsumer: Send + Sync {
    /// Subscribe to the change feed.
    fn subscribe(&self) -> Result<(), SyncError>;

    /// Consume until the feed ends or shutdown is signaled.
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        ack_receiver: mpsc::Receiver<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), SyncError>;
}
