//! Source store trait definition.

use async_trait::async_trait;

use crate::errors::SourceStoreError;
use crate::types::SourceRecord;
use search_sync_shared::Collection;

/// Abstracts the source-of-truth document store.
///
/// The only capability the batch sync path needs from the store is a
/// cursor-paginated read: records of one collection in ascending primary-key
/// order, starting strictly after an optional cursor.
///
/// The ordering is a stable total order over the primary key, so no record is
/// skipped or duplicated across pages as long as no record already passed is
/// deleted and none is inserted with a key sorting before the cursor. That is
/// a weak-consistency contract, not snapshot isolation.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Fetch up to `limit` records of `collection` with primary keys strictly
    /// greater than `cursor`, in ascending key order.
    ///
    /// A `cursor` of `None` starts from the beginning of the collection.
    /// Returns an empty vector when the collection is exhausted at the
    /// cursor.
    async fn fetch_after(
        &self,
        collection: Collection,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SourceRecord>, SourceStoreError>;
}
