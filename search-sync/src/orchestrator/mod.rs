//! Orchestrator module for the change-triggered sync path.
//!
//! Coordinates the consumer, processor, and loader components.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, instrument};

use crate::consumer::{ChangeConsumer, ChangeEvent, StreamMessage};
use crate::errors::SyncError;
use crate::loader::SearchLoader;
use crate::processor::{DocumentProcessor, ProcessedEvent};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffer.
    pub channel_buffer_size: usize,
    /// How often to log processing progress.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Orchestrator that coordinates the change-event flow.
///
/// The orchestrator:
/// - Routes change-event batches from the consumer to processor and loader
/// - Acknowledges batches back to the consumer after each attempt
/// - Handles shutdown signals
pub struct Orchestrator {
    consumer: Arc<dyn ChangeConsumer>,
    processor: DocumentProcessor,
    loader: SearchLoader,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    /// Total number of change events processed since startup.
    total_events_processed: Arc<AtomicU64>,
    /// Total number of documents upserted since startup.
    total_documents_upserted: Arc<AtomicU64>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        consumer: Arc<dyn ChangeConsumer>,
        processor: DocumentProcessor,
        loader: SearchLoader,
    ) -> Self {
        Self::with_config(consumer, processor, loader, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        consumer: Arc<dyn ChangeConsumer>,
        processor: DocumentProcessor,
        loader: SearchLoader,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            consumer,
            processor,
            loader,
            config,
            shutdown_tx,
            total_events_processed: Arc::new(AtomicU64::new(0)),
            total_documents_upserted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the orchestrator.
    ///
    /// Blocks until the consumer stream ends or a shutdown signal is
    /// received. Processing failures for a batch are logged and acknowledged
    /// as failed; the events are dropped, not redelivered.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), SyncError> {
        info!("Starting change-sync orchestrator");

        self.consumer.subscribe()?;

        let (event_transmitter, mut event_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);
        let (ack_transmitter, ack_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        // Start consumer in background
        let consumer = Arc::clone(&self.consumer);
        let shutdown_rx = self.shutdown_tx.subscribe();

        let consumer_handle = tokio::spawn(async move {
            if let Err(e) = consumer
                .run(event_transmitter, ack_receiver, shutdown_rx)
                .await
            {
                error!(error = %e, "Consumer error");
            }
        });

        info!("Ready to process change events");

        let total_events = Arc::clone(&self.total_events_processed);
        let total_docs = Arc::clone(&self.total_documents_upserted);
        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                msg = event_receiver.recv() => {
                    match msg {
                        Some(StreamMessage::Events { events, offsets }) => {
                            debug!(
                                event_count = events.len(),
                                offset_count = offsets.len(),
                                "Received change events from consumer"
                            );
                            match self.process_events(events).await {
                                Ok(()) => {
                                    let _ = ack_transmitter.send(StreamMessage::Acknowledgment {
                                        offsets,
                                        success: true,
                                        error: None,
                                    }).await;
                                }
                                Err(e) => {
                                    error!(error = %e, "Failed to process change events; dropping batch");
                                    let _ = ack_transmitter.send(StreamMessage::Acknowledgment {
                                        offsets,
                                        success: false,
                                        error: Some(e.to_string()),
                                    }).await;
                                }
                            }
                        }
                        Some(StreamMessage::Error(e)) => {
                            error!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                        Some(StreamMessage::Acknowledgment { .. }) => {
                            // Acknowledgments belong on the ack channel
                            debug!("Ignoring acknowledgment received on event channel");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = progress_timer.tick() => {
                    info!(
                        events_processed = total_events.load(Ordering::Relaxed),
                        documents_upserted = total_docs.load(Ordering::Relaxed),
                        "Processing progress"
                    );
                }
            }
        }

        // Wait for consumer to finish
        let _ = consumer_handle.await;

        info!(
            total_events_processed = self.total_events_processed.load(Ordering::Relaxed),
            total_documents_upserted = self.total_documents_upserted.load(Ordering::Relaxed),
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Process a batch of change events through the pipeline.
    ///
    /// Documents are flushed to the index before this returns Ok, so the
    /// batch is only acknowledged once it is actually applied.
    async fn process_events(&mut self, events: Vec<ChangeEvent>) -> Result<(), SyncError> {
        let event_count = events.len();
        self.total_events_processed
            .fetch_add(event_count as u64, Ordering::Relaxed);

        let processed = self.processor.process_changes(events)?;

        if processed.is_empty() {
            return Ok(());
        }

        let upsert_count = processed
            .iter()
            .filter(|e| matches!(e, ProcessedEvent::Upsert(_)))
            .count();
        self.total_documents_upserted
            .fetch_add(upsert_count as u64, Ordering::Relaxed);

        self.loader.load(processed).await?;
        self.loader.flush().await?;

        Ok(())
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
