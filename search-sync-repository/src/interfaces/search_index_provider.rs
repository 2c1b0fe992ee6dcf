//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch,
//! etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationSummary, IndexStats};
use search_sync_shared::{Collection, SearchDocument};

/// Abstracts the underlying search index implementation.
///
/// Implementations are injected into `SearchIndexService` and the pipeline
/// components to enable dependency injection and easy testing with mocks.
///
/// # Note on Document Creation
///
/// There is no separate `create_document` function. `upsert_document`
/// performs an insert-or-replace keyed on the document's identifier, which is
/// always the primary key of the corresponding source-store record. Replaying
/// the same document is therefore harmless: the second submission's field
/// values win and no duplicate entry is created.
///
/// # Index Initialization
///
/// Implementations should have `ensure_index_exists` called once per
/// collection during application startup, before any document operations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the index for a collection exists with its settings and alias,
    /// creating it if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If initialization fails
    async fn ensure_index_exists(&self, collection: Collection) -> Result<(), SearchIndexError>;

    /// Upsert a single document into its collection's index.
    ///
    /// Refreshes the document's synchronization timestamp: `synced_at` is set
    /// on every write, `first_synced_at` only when the index entry is first
    /// created.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was created or updated
    /// * `Err(SearchIndexError)` - If the operation fails
    async fn upsert_document(&self, document: &SearchDocument) -> Result<(), SearchIndexError>;

    /// Upsert multiple documents and return a summary of successful and
    /// failed operations.
    ///
    /// Documents may span collections; each is routed to its own index.
    /// Individual failures are reported in the summary rather than aborting
    /// the remaining items.
    async fn bulk_upsert_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Delete a document from a collection's index by its identifier.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(
        &self,
        collection: Collection,
        document_id: &str,
    ) -> Result<(), SearchIndexError>;

    /// Query live statistics for a collection's index.
    async fn index_stats(&self, collection: Collection) -> Result<IndexStats, SearchIndexError>;
}
