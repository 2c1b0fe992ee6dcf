//! Request and response types for repository operations.

use crate::errors::SearchIndexError;
use search_sync_shared::Collection;

/// A raw record read from the source-of-truth store.
///
/// The `id` is the record's primary key; `data` is the stored document body.
/// The processor is responsible for decoding `data` into a typed
/// `SearchDocument` before anything reaches the index writer.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// Primary key in the source store.
    pub id: String,
    /// Document body as stored.
    pub data: serde_json::Value,
}

/// Result of a batch operation for a single document.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document's join-key identifier.
    pub document_id: String,
    /// The collection the document belongs to.
    pub collection: Collection,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and
/// individual results.
#[derive(Debug, Clone)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Summary for an empty batch.
    pub fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            results: vec![],
        }
    }
}

/// Outcome of initializing one search index.
///
/// Initialization is reported per index rather than failing fast so that one
/// misconfigured index does not block bootstrapping the others.
#[derive(Debug, Clone)]
pub struct IndexInitResult {
    /// The index alias that was initialized.
    pub index: String,
    /// Whether initialization succeeded.
    pub success: bool,
    /// Error if initialization failed.
    pub error: Option<SearchIndexError>,
}

/// Live statistics for one search index.
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    /// Number of documents currently in the index.
    pub documents: u64,
}
