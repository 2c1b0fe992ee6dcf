//! Loader module for the sync pipeline.
//!
//! Applies processed events to the search index: upserts are batched into
//! bulk writes, deletes flush the buffer first so events within a batch apply
//! in arrival order.

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::errors::SyncError;
use crate::processor::ProcessedEvent;
use search_sync_repository::{SearchIndexProvider, SearchIndexService};
use search_sync_shared::{Collection, SearchDocument};

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents to batch before flushing.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Loader that writes documents into the search index.
///
/// All writes go through `SearchIndexService`, so document validation and the
/// batch size guard apply to every real write path. Upserts accumulate in a
/// pending buffer and go out as one bulk call; the whole buffer fails
/// together, so a batch-sync page is either fully applied or must be
/// re-driven from the last successful cursor.
pub struct SearchLoader {
    service: SearchIndexService,
    config: LoaderConfig,
    pending_upserts: Vec<SearchDocument>,
}

impl SearchLoader {
    /// Create a new loader with the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self::with_config(provider, LoaderConfig::default())
    }

    /// Create a new loader with custom configuration.
    pub fn with_config(provider: Arc<dyn SearchIndexProvider>, config: LoaderConfig) -> Self {
        Self::with_service(SearchIndexService::new(provider), config)
    }

    /// Create a new loader over an already-configured service.
    pub fn with_service(service: SearchIndexService, config: LoaderConfig) -> Self {
        let batch_size = config.batch_size;
        Self {
            service,
            config,
            pending_upserts: Vec::with_capacity(batch_size),
        }
    }

    /// Load a batch of processed events.
    ///
    /// Events apply in arrival order: upserts are buffered and flushed when
    /// the batch size is reached, and a delete flushes the buffer before it
    /// executes, so a delete never overtakes a buffered upsert of the same
    /// document.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn load(&mut self, events: Vec<ProcessedEvent>) -> Result<(), SyncError> {
        for event in events {
            match event {
                ProcessedEvent::Upsert(document) => {
                    self.pending_upserts.push(document);
                    if self.pending_upserts.len() >= self.config.batch_size {
                        self.flush().await?;
                    }
                }
                ProcessedEvent::Delete {
                    collection,
                    document_id,
                } => {
                    self.flush().await?;
                    self.delete(collection, &document_id).await;
                }
            }
        }

        Ok(())
    }

    /// Flush all pending upserts to the search index.
    ///
    /// Any failed document fails the flush: there is no partial-page retry,
    /// the caller re-runs from its last successful cursor.
    #[instrument(skip(self))]
    pub async fn flush(&mut self) -> Result<(), SyncError> {
        if self.pending_upserts.is_empty() {
            return Ok(());
        }

        let documents: Vec<SearchDocument> = self.pending_upserts.drain(..).collect();
        let count = documents.len();

        debug!(count = count, "Flushing documents to search index");

        let summary = self.service.batch_upsert(&documents).await.map_err(|e| {
            error!(error = %e, count = count, "Failed to bulk upsert documents");
            SyncError::loader(format!("Failed to bulk upsert {count} documents: {e}"))
        })?;

        if summary.failed > 0 {
            for result in summary.results.iter().filter(|r| !r.success) {
                if let Some(ref err) = result.error {
                    error!(
                        document_id = %result.document_id,
                        collection = %result.collection,
                        error = %err,
                        "Failed to upsert document"
                    );
                }
            }
            return Err(SyncError::loader(format!(
                "Bulk upsert applied {} of {} documents",
                summary.succeeded, summary.total
            )));
        }

        debug!(count = summary.succeeded, "Successfully upserted all documents");
        Ok(())
    }

    /// Apply one delete operation.
    ///
    /// Delete failures are logged and dropped; the record may never have been
    /// indexed, and the change-event path has no redelivery.
    async fn delete(&self, collection: Collection, document_id: &str) {
        if let Err(e) = self.service.delete(collection, document_id).await {
            warn!(
                document_id = %document_id,
                collection = %collection,
                error = %e,
                "Failed to delete document"
            );
        }
    }
}
