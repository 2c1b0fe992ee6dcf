//! Abstract interfaces for the external collaborators of the sync pipeline.

mod search_index_provider;
mod source_store;

pub use search_index_provider::SearchIndexProvider;
pub use source_store::SourceStore;
