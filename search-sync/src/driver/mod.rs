//! Full-collection sync driver.
//!
//! Orchestrates the batch reader and the loader across all synchronized
//! collections until each reports exhaustion. The batch path only ever
//! upserts; records deleted from the source between resyncs are removed from
//! the index by the change-triggered path alone.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::errors::SyncError;
use crate::loader::SearchLoader;
use crate::processor::{DocumentProcessor, ProcessedEvent};
use crate::reader::BatchReader;
use search_sync_repository::{SearchIndexProvider, SourceStore};
use search_sync_shared::Collection;

/// Total number of records in a collection, as far as the driver knows.
///
/// The source store does not expose a fast count, so the total is normally
/// unknown; the sentinel makes that explicit instead of a magic `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTotal {
    /// The source store cannot report a total ahead of time.
    Unknown,
    /// A known total, when a store can provide one.
    Known(u64),
}

/// Progress notification emitted after every successfully applied page.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub collection: Collection,
    /// Documents synced so far in this collection.
    pub synced: u64,
    pub total: ProgressTotal,
}

/// Per-collection outcome of a full sync.
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub collection: Collection,
    pub pages_read: u64,
    pub documents_synced: u64,
}

/// Outcome of a completed full sync across all collections.
#[derive(Debug, Clone)]
pub struct FullSyncReport {
    pub collections: Vec<CollectionStats>,
}

impl FullSyncReport {
    /// Total documents synced across all collections.
    pub fn total_documents(&self) -> u64 {
        self.collections.iter().map(|s| s.documents_synced).sum()
    }
}

/// Driver that resynchronizes every collection from the source store.
pub struct FullSyncDriver {
    reader: BatchReader,
    processor: DocumentProcessor,
    loader: SearchLoader,
}

impl FullSyncDriver {
    /// Create a driver with the default page size.
    pub fn new(store: Arc<dyn SourceStore>, provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            reader: BatchReader::new(store),
            processor: DocumentProcessor::new(),
            loader: SearchLoader::new(provider),
        }
    }

    /// Create a driver with a custom page size.
    pub fn with_page_size(
        store: Arc<dyn SourceStore>,
        provider: Arc<dyn SearchIndexProvider>,
        page_size: usize,
    ) -> Self {
        Self {
            reader: BatchReader::with_page_size(store, page_size),
            processor: DocumentProcessor::new(),
            loader: SearchLoader::new(provider),
        }
    }

    /// Run a full sync over all collections.
    ///
    /// Collections are processed sequentially in `Collection::ALL` order; a
    /// failure anywhere aborts the whole run and the error propagates. The
    /// optional channel receives a progress event after every applied page;
    /// a dropped receiver does not stop the sync.
    #[instrument(skip(self, progress))]
    pub async fn run(
        &mut self,
        progress: Option<mpsc::Sender<ProgressEvent>>,
    ) -> Result<FullSyncReport, SyncError> {
        info!("Starting full sync");

        let mut collections = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            let stats = self.sync_collection(collection, progress.as_ref()).await?;
            info!(
                collection = %collection,
                documents_synced = stats.documents_synced,
                pages_read = stats.pages_read,
                "Collection fully synced"
            );
            collections.push(stats);
        }

        let report = FullSyncReport { collections };
        info!(
            total_documents = report.total_documents(),
            "Full sync complete"
        );
        Ok(report)
    }

    /// Sync one collection to exhaustion.
    ///
    /// The cursor advances only after the page has been written to the index,
    /// so a failed run can resume from the last successful cursor without
    /// skipping records.
    async fn sync_collection(
        &mut self,
        collection: Collection,
        progress: Option<&mpsc::Sender<ProgressEvent>>,
    ) -> Result<CollectionStats, SyncError> {
        let mut cursor: Option<String> = None;
        let mut pages_read: u64 = 0;
        let mut documents_synced: u64 = 0;

        loop {
            let page = self.reader.read_page(collection, cursor.as_deref()).await?;
            pages_read += 1;

            if !page.records.is_empty() {
                let documents = self.processor.process_page(collection, &page.records)?;
                let count = documents.len() as u64;

                let events: Vec<ProcessedEvent> =
                    documents.into_iter().map(ProcessedEvent::Upsert).collect();
                self.loader.load(events).await?;
                self.loader.flush().await?;

                documents_synced += count;

                if let Some(tx) = progress {
                    let _ = tx
                        .send(ProgressEvent {
                            collection,
                            synced: documents_synced,
                            total: ProgressTotal::Unknown,
                        })
                        .await;
                }
            }

            if let Some(last_id) = page.last_id {
                cursor = Some(last_id);
            }

            if page.done {
                break;
            }
        }

        Ok(CollectionStats {
            collection,
            pages_read,
            documents_synced,
        })
    }
}
