//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use chrono::Utc;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesPutAliasParts},
    CountParts, DeleteParts, OpenSearch, UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{index_settings, IndexConfig};
use crate::types::{BatchOperationResult, BatchOperationSummary, IndexStats};
use search_sync_shared::{Collection, SearchDocument};

/// OpenSearch provider implementation.
///
/// Maintains one index per synchronized collection, addressed through its
/// unversioned alias. The document id in every index is the source store's
/// primary key, so upserts and deletes are idempotent by construction.
///
/// # Example
///
/// ```ignore
/// use search_sync_repository::opensearch::IndexConfig;
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::new(0)).await?;
/// provider.ensure_index_exists(Collection::Breeds).await?;
/// provider.upsert_document(&document).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - Index configuration containing the version number
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index_version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Serialize a document into its index payload.
    fn index_payload(document: &SearchDocument) -> Result<Value, SearchIndexError> {
        let payload = match document {
            SearchDocument::Breed(doc) => serde_json::to_value(doc),
            SearchDocument::Kennel(doc) => serde_json::to_value(doc),
            SearchDocument::Listing(doc) => serde_json::to_value(doc),
        }
        .map_err(|e| SearchIndexError::serialization(e.to_string()))?;

        match payload {
            Value::Object(_) => Ok(payload),
            other => Err(SearchIndexError::serialization(format!(
                "document serialized to non-object payload: {other}"
            ))),
        }
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Ensure the index for a collection exists, creating it with its
    /// settings and registering its alias if necessary.
    async fn ensure_index_exists(&self, collection: Collection) -> Result<(), SearchIndexError> {
        let index_name = self.index_config.versioned_name(collection);
        let alias = collection.index_alias();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&index_name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().as_u16() == 404 {
            let settings = index_settings(collection);
            let response = self
                .client
                .indices()
                .create(IndicesCreateParts::Index(&index_name))
                .body(settings)
                .send()
                .await
                .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

            let status = response.status_code();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                error!(index = %index_name, status = %status, body = %error_body, "Index creation failed");
                return Err(SearchIndexError::index_creation(format!(
                    "Creating index '{}' failed with status {}: {}",
                    index_name, status, error_body
                )));
            }

            info!(index = %index_name, "Created search index");
        }

        // Point the alias at the versioned index; idempotent if it already does.
        let response = self
            .client
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(&[&index_name], alias))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %index_name, alias = %alias, status = %status, body = %error_body, "Alias registration failed");
            return Err(SearchIndexError::index_creation(format!(
                "Registering alias '{}' for index '{}' failed with status {}: {}",
                alias, index_name, status, error_body
            )));
        }

        debug!(index = %index_name, alias = %alias, "Index ready");
        Ok(())
    }

    /// Upsert a document into its collection's index.
    ///
    /// Uses the update API with an explicit upsert body so the two
    /// synchronization timestamps behave differently: `first_synced_at` is
    /// written only when the index entry is created, `synced_at` refreshes on
    /// every subsequent write.
    async fn upsert_document(&self, document: &SearchDocument) -> Result<(), SearchIndexError> {
        document
            .validate()
            .map_err(SearchIndexError::validation)?;

        let alias = document.collection().index_alias();
        let doc_id = document.id().to_string();
        let payload = Self::index_payload(document)?;
        let now = Utc::now();

        let mut update = payload.clone();
        update["synced_at"] = json!(now);
        let mut create = payload;
        create["first_synced_at"] = json!(now);

        let response = self
            .client
            .update(UpdateParts::IndexId(alias, &doc_id))
            .body(json!({
                "doc": update,
                "upsert": create
            }))
            .send()
            .await
            .map_err(|e| SearchIndexError::upsert(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(doc_id = %doc_id, status = %status, body = %error_body, "Upsert request failed");
            return Err(SearchIndexError::upsert(format!(
                "Upsert failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %alias, doc_id = %doc_id, "Document upserted");
        Ok(())
    }

    /// Upsert multiple documents and return a summary of successful and
    /// failed operations.
    ///
    /// Processes each document individually and collects results; one failed
    /// document does not stop the remaining items. Callers that need
    /// whole-page semantics check `summary.failed`.
    async fn bulk_upsert_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut results = Vec::with_capacity(documents.len());
        let mut succeeded = 0;
        let mut failed = 0;

        for document in documents {
            match self.upsert_document(document).await {
                Ok(()) => {
                    succeeded += 1;
                    results.push(BatchOperationResult {
                        document_id: document.id().to_string(),
                        collection: document.collection(),
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    failed += 1;
                    results.push(BatchOperationResult {
                        document_id: document.id().to_string(),
                        collection: document.collection(),
                        success: false,
                        error: Some(e),
                    });
                }
            }
        }

        Ok(BatchOperationSummary {
            total: documents.len(),
            succeeded,
            failed,
            results,
        })
    }

    /// Delete a document from a collection's index.
    ///
    /// A missing document is not an error; the record may never have been
    /// synced or was already removed.
    async fn delete_document(
        &self,
        collection: Collection,
        document_id: &str,
    ) -> Result<(), SearchIndexError> {
        let alias = collection.index_alias();

        let response = self
            .client
            .delete(DeleteParts::IndexId(alias, document_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(doc_id = %document_id, status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %alias, doc_id = %document_id, "Document deleted");
        Ok(())
    }

    /// Query the live document count for a collection's index.
    async fn index_stats(&self, collection: Collection) -> Result<IndexStats, SearchIndexError> {
        let alias = collection.index_alias();

        let response = self
            .client
            .count(CountParts::Index(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchIndexError::parse(format!(
                "Count for index '{}' failed with status {}: {}",
                alias, status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let documents = body["count"].as_u64().ok_or_else(|| {
            SearchIndexError::parse(format!("count response missing 'count' field: {body}"))
        })?;

        Ok(IndexStats { documents })
    }
}
