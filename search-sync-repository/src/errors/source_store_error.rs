//! Source store error types.

use thiserror::Error;

/// Errors from the source-of-truth document store.
#[derive(Debug, Clone, Error)]
pub enum SourceStoreError {
    /// Failed to connect to the source store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A read query failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A fetched row could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl SourceStoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }
}
