//! # Search Sync
//!
//! Keeps the Doghouse marketplace search indices consistent with the
//! source-of-truth document store. Two paths feed the same indices:
//!
//! 1. **Batch sync**: the full-collection driver pages through every source
//!    collection with a resumable cursor and bulk-upserts each page.
//! 2. **Change-triggered sync**: a consumer receives per-document change
//!    events and applies the equivalent single-document upsert or delete.
//!
//! No ordering is guaranteed between the two paths; correctness relies on
//! upserts and deletes being idempotent (the index document id is always the
//! source primary key) and last-write-wins convergence.
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Change-event intake (trait + Kafka implementation)
//! - [`reader`]: Cursor-paginated batch reader over the source store
//! - [`processor`]: Decodes raw records and change events into typed documents
//! - [`loader`]: Applies upserts and deletes to the search index
//! - [`driver`]: Full-collection sync across all collections
//! - [`orchestrator`]: Coordinates the change-event flow
//! - [`errors`]: Error types for the pipeline

pub mod config;
pub mod consumer;
pub mod driver;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod reader;

pub use config::Dependencies;
pub use errors::SyncError;

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
