//! Search index service implementation.
//!
//! High-level API over a `SearchIndexProvider`: input validation, batch-size
//! guarding, and per-index initialization with failure isolation.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SearchIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{BatchOperationSummary, IndexInitResult};
use search_sync_shared::{Collection, SearchDocument};

/// The main service for interacting with the search index.
///
/// Application code goes through this rather than the provider directly: it
/// validates documents, enforces the batch size limit, and exposes the
/// bootstrap routine that registers every collection's index.
///
/// # Note on Document Creation
///
/// There is no separate `create` function. `upsert` creates the document if
/// it doesn't exist, or replaces its fields if it does.
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new service with default configuration (batch limit 1000).
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new service with custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Initialize the index for every synchronized collection.
    ///
    /// Each index is attempted independently and reported as its own result
    /// entry, so a misconfigured index does not block bootstrapping the
    /// others. The caller decides what a partial failure means for it.
    pub async fn initialize_indexes(&self) -> Vec<IndexInitResult> {
        let mut results = Vec::with_capacity(Collection::ALL.len());

        for collection in Collection::ALL {
            let alias = collection.index_alias().to_string();
            match self.provider.ensure_index_exists(collection).await {
                Ok(()) => {
                    info!(index = %alias, "Search index initialized");
                    results.push(IndexInitResult {
                        index: alias,
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(index = %alias, error = %e, "Search index initialization failed");
                    results.push(IndexInitResult {
                        index: alias,
                        success: false,
                        error: Some(e),
                    });
                }
            }
        }

        results
    }

    /// Upsert a single document into its collection's index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was created or updated
    /// * `Err(SearchIndexError::ValidationError)` - If the join key is missing
    /// * `Err(SearchIndexError)` - If the operation fails
    pub async fn upsert(&self, document: &SearchDocument) -> Result<(), SearchIndexError> {
        document.validate().map_err(SearchIndexError::validation)?;
        self.provider.upsert_document(document).await
    }

    /// Delete a document from a collection's index.
    ///
    /// A document that doesn't exist is considered successfully deleted.
    pub async fn delete(
        &self,
        collection: Collection,
        document_id: &str,
    ) -> Result<(), SearchIndexError> {
        if document_id.trim().is_empty() {
            return Err(SearchIndexError::validation("document_id is required"));
        }
        self.provider.delete_document(collection, document_id).await
    }

    /// Upsert multiple documents and return a summary of successful and
    /// failed operations.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Aggregate statistics plus per-item results
    /// * `Err(SearchIndexError::BatchSizeExceeded)` - If the batch exceeds the limit
    /// * `Err(SearchIndexError::ValidationError)` - If any document fails validation
    pub async fn batch_upsert(
        &self,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        self.validate_batch_size(documents.len())?;

        for document in documents {
            document.validate().map_err(SearchIndexError::validation)?;
        }

        self.provider.bulk_upsert_documents(documents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatchOperationResult, IndexStats};
    use async_trait::async_trait;
    use search_sync_shared::BreedDocument;
    use std::sync::Mutex;

    /// Mock provider for testing; fails `ensure_index_exists` for the
    /// collections listed in `broken_indexes`.
    struct MockProvider {
        broken_indexes: Vec<Collection>,
        upserts: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                broken_indexes: vec![],
                upserts: Mutex::new(vec![]),
                deletes: Mutex::new(vec![]),
            }
        }

        fn with_broken_indexes(broken: Vec<Collection>) -> Self {
            Self {
                broken_indexes: broken,
                upserts: Mutex::new(vec![]),
                deletes: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockProvider {
        async fn ensure_index_exists(
            &self,
            collection: Collection,
        ) -> Result<(), SearchIndexError> {
            if self.broken_indexes.contains(&collection) {
                Err(SearchIndexError::index_creation("malformed mapping"))
            } else {
                Ok(())
            }
        }

        async fn upsert_document(
            &self,
            document: &SearchDocument,
        ) -> Result<(), SearchIndexError> {
            self.upserts.lock().unwrap().push(document.id().to_string());
            Ok(())
        }

        async fn bulk_upsert_documents(
            &self,
            documents: &[SearchDocument],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            for document in documents {
                self.upserts.lock().unwrap().push(document.id().to_string());
            }
            Ok(BatchOperationSummary {
                total: documents.len(),
                succeeded: documents.len(),
                failed: 0,
                results: documents
                    .iter()
                    .map(|d| BatchOperationResult {
                        document_id: d.id().to_string(),
                        collection: d.collection(),
                        success: true,
                        error: None,
                    })
                    .collect(),
            })
        }

        async fn delete_document(
            &self,
            _collection: Collection,
            document_id: &str,
        ) -> Result<(), SearchIndexError> {
            self.deletes.lock().unwrap().push(document_id.to_string());
            Ok(())
        }

        async fn index_stats(
            &self,
            _collection: Collection,
        ) -> Result<IndexStats, SearchIndexError> {
            Ok(IndexStats {
                documents: self.upserts.lock().unwrap().len() as u64,
            })
        }
    }

    fn breed(id: &str) -> SearchDocument {
        SearchDocument::Breed(BreedDocument {
            id: id.to_string(),
            name: "Akita".to_string(),
            description: None,
            group: None,
            size: None,
            care_requirements: vec![],
            traits: None,
        })
    }

    #[tokio::test]
    async fn test_initialize_indexes_isolates_failures() {
        let provider = Arc::new(MockProvider::with_broken_indexes(vec![Collection::Kennels]));
        let service = SearchIndexService::new(provider);

        let results = service.initialize_indexes().await;

        // One bad index must not block the other two.
        assert_eq!(results.len(), 3);
        let kennels = results
            .iter()
            .find(|r| r.index == "doghouse-kennels")
            .unwrap();
        assert!(!kennels.success);
        assert!(kennels.error.is_some());
        for other in results.iter().filter(|r| r.index != "doghouse-kennels") {
            assert!(other.success, "index {} should have initialized", other.index);
            assert!(other.error.is_none());
        }
    }

    #[tokio::test]
    async fn test_batch_upsert_enforces_limit() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::with_config(
            provider,
            SearchIndexServiceConfig::with_max_batch_size(2),
        );

        let documents = vec![breed("breed-1"), breed("breed-2"), breed("breed-3")];
        let result = service.batch_upsert(&documents).await;
        assert!(matches!(
            result.unwrap_err(),
            SearchIndexError::BatchSizeExceeded {
                provided: 3,
                max: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_batch_upsert_validates_documents() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::new(provider);

        let documents = vec![breed("breed-1"), breed("")];
        let result = service.batch_upsert(&documents).await;
        assert!(matches!(
            result.unwrap_err(),
            SearchIndexError::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_id() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::new(provider);

        let result = service.delete(Collection::Breeds, " ").await;
        assert!(matches!(
            result.unwrap_err(),
            SearchIndexError::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let provider = Arc::new(MockProvider::new());
        let service = SearchIndexService::new(provider);

        let summary = service.batch_upsert(&[]).await.unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.succeeded, 0);
    }
}
