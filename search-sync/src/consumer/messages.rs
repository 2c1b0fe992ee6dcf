//! Message types for the change-event consumer.

use serde::Deserialize;

use crate::errors::SyncError;
use search_sync_shared::Collection;

/// Wire format of a change notification on the changes topic.
///
/// The marketplace backend publishes one envelope per document mutation:
/// creates and updates carry the current document body in `record`, deletes
/// set `deleted` and omit the body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEnvelope {
    pub collection: Collection,
    pub document_id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub record: Option<serde_json::Value>,
}

/// What happened to the source document.
#[derive(Debug, Clone)]
pub enum ChangeKind {
    /// The document was created or updated; carries the current body.
    /// The two cases are intentionally not distinguished: either way the
    /// current state must be reflected in the index.
    Written(serde_json::Value),
    /// The document was deleted from the source store.
    Deleted,
}

/// A per-document change event flowing through the pipeline.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub document_id: String,
    pub change: ChangeKind,
}

impl ChangeEvent {
    /// Create a create-or-update event.
    pub fn written(
        collection: Collection,
        document_id: impl Into<String>,
        record: serde_json::Value,
    ) -> Self {
        Self {
            collection,
            document_id: document_id.into(),
            change: ChangeKind::Written(record),
        }
    }

    /// Create a delete event.
    pub fn deleted(collection: Collection, document_id: impl Into<String>) -> Self {
        Self {
            collection,
            document_id: document_id.into(),
            change: ChangeKind::Deleted,
        }
    }

    /// Convert a wire envelope into a change event.
    pub fn from_envelope(envelope: ChangeEnvelope) -> Result<Self, SyncError> {
        if envelope.document_id.trim().is_empty() {
            return Err(SyncError::parse("change envelope missing document_id"));
        }
        if envelope.deleted {
            return Ok(Self::deleted(envelope.collection, envelope.document_id));
        }
        match envelope.record {
            Some(record) => Ok(Self::written(
                envelope.collection,
                envelope.document_id,
                record,
            )),
            None => Err(SyncError::parse(format!(
                "change envelope for '{}' has neither a record nor the deleted flag",
                envelope.document_id
            ))),
        }
    }
}

/// Messages that flow between the consumer and the orchestrator.
#[derive(Debug)]
pub enum StreamMessage {
    /// A batch of change events with associated offsets for acknowledgment.
    Events {
        events: Vec<ChangeEvent>,
        offsets: Vec<(String, i32, i64)>,
    },
    /// Acknowledgment that events were processed (successfully or not).
    Acknowledgment {
        offsets: Vec<(String, i32, i64)>,
        success: bool,
        error: Option<String>,
    },
    /// Stream has ended.
    End,
    /// An error occurred.
    Error(String),
}
