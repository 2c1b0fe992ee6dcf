//! Error types for the repository crate.

mod search_index_error;
mod source_store_error;

pub use search_index_error::SearchIndexError;
pub use source_store_error::SourceStoreError;
