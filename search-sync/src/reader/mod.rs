//! Cursor-paginated batch reader over the source store.
//!
//! Enumerates all records of one collection in bounded-size pages, resumable
//! across invocations via a last-seen-identifier cursor.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::errors::SyncError;
use search_sync_repository::{SourceRecord, SourceStore};
use search_sync_shared::Collection;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of source records plus the resumable cursor state.
#[derive(Debug)]
pub struct DocumentPage {
    /// Records in ascending primary-key order.
    pub records: Vec<SourceRecord>,
    /// Identifier of the last record in the page; `None` only when the page
    /// is empty.
    pub last_id: Option<String>,
    /// Whether the collection is exhausted. True exactly when the page holds
    /// strictly fewer records than the page size, so a page of exactly
    /// page-size records always triggers one more read, which may come back
    /// empty and only then signals completion.
    pub done: bool,
    /// When this page was read from the store. Synchronization metadata, not
    /// a business timestamp.
    pub observed_at: DateTime<Utc>,
}

/// Reader that pages through a source collection.
pub struct BatchReader {
    store: Arc<dyn SourceStore>,
    page_size: usize,
}

impl BatchReader {
    /// Create a reader with the default page size.
    pub fn new(store: Arc<dyn SourceStore>) -> Self {
        Self::with_page_size(store, DEFAULT_PAGE_SIZE)
    }

    /// Create a reader with a custom page size.
    pub fn with_page_size(store: Arc<dyn SourceStore>, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self { store, page_size }
    }

    /// The configured page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Read the next page of a collection.
    ///
    /// With `cursor = None` the read starts at the beginning; otherwise it
    /// returns records strictly after the cursor identifier. An empty
    /// collection at the cursor yields an empty, `done` page with
    /// `last_id = None`.
    pub async fn read_page(
        &self,
        collection: Collection,
        cursor: Option<&str>,
    ) -> Result<DocumentPage, SyncError> {
        let records = self
            .store
            .fetch_after(collection, cursor, self.page_size)
            .await?;

        let done = records.len() < self.page_size;
        let last_id = records.last().map(|record| record.id.clone());

        debug!(
            collection = %collection,
            cursor = cursor.unwrap_or("<start>"),
            fetched = records.len(),
            done = done,
            "Read source page"
        );

        Ok(DocumentPage {
            records,
            last_id,
            done,
            observed_at: Utc::now(),
        })
    }
}
