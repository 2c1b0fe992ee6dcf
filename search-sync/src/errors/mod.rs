//! Error types for the sync pipeline.

use thiserror::Error;

/// Errors that can occur in the sync pipeline.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Error reading from the source store.
    #[error("Reader error: {0}")]
    ReaderError(String),

    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Error parsing or decoding data.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Kafka-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl SyncError {
    /// Create a reader error.
    pub fn reader(msg: impl Into<String>) -> Self {
        Self::ReaderError(msg.into())
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for SyncError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}

impl From<search_sync_repository::SourceStoreError> for SyncError {
    fn from(err: search_sync_repository::SourceStoreError) -> Self {
        Self::ReaderError(err.to_string())
    }
}
