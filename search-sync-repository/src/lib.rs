//! # Search Sync Repository
//!
//! This crate provides the collaborator interfaces of the sync pipeline and
//! their concrete implementations: the search index (trait plus OpenSearch
//! backend) and the source-of-truth store (trait plus Postgres and in-memory
//! backends). It also includes the `SearchIndexService` wrapper used by
//! application code for validation and index bootstrapping.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod postgres;
pub mod service;
pub mod types;

pub use config::SearchIndexServiceConfig;
pub use errors::{SearchIndexError, SourceStoreError};
pub use interfaces::{SearchIndexProvider, SourceStore};
pub use memory::MemorySourceStore;
pub use opensearch::OpenSearchProvider;
pub use postgres::PostgresSourceStore;
pub use service::SearchIndexService;
pub use types::{
    BatchOperationResult, BatchOperationSummary, IndexInitResult, IndexStats, SourceRecord,
};
