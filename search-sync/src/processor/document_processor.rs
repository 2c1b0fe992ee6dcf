//! Document processor implementation.
//!
//! Turns untyped source records into validated `SearchDocument` values and
//! change events into index operations. Nothing untyped passes this point.

use tracing::{debug, instrument};

use crate::consumer::{ChangeEvent, ChangeKind};
use crate::errors::SyncError;
use search_sync_repository::SourceRecord;
use search_sync_shared::{Collection, SearchDocument};

/// Index operation produced by the processor.
#[derive(Debug)]
pub enum ProcessedEvent {
    /// Document to be upserted (create or update).
    Upsert(SearchDocument),
    /// Document to be deleted from the index.
    Delete {
        collection: Collection,
        document_id: String,
    },
}

/// Processor that decodes records and change events into index operations.
pub struct DocumentProcessor {
    // Could hold per-collection enrichment hooks in the future
}

impl DocumentProcessor {
    /// Create a new processor.
    pub fn new() -> Self {
        Self {}
    }

    /// Decode one source record into the typed document for its collection.
    ///
    /// Enforces the join-key invariant: the identifier inside the document
    /// body must equal the record's primary key, since the index reuses it as
    /// the document id.
    pub fn decode_record(
        &self,
        collection: Collection,
        record: &SourceRecord,
    ) -> Result<SearchDocument, SyncError> {
        let document = match collection {
            Collection::Breeds => serde_json::from_value(record.data.clone())
                .map(SearchDocument::Breed),
            Collection::Kennels => serde_json::from_value(record.data.clone())
                .map(SearchDocument::Kennel),
            Collection::Listings => serde_json::from_value(record.data.clone())
                .map(SearchDocument::Listing),
        }
        .map_err(|e| {
            SyncError::parse(format!(
                "record '{}' in collection '{}' does not decode: {}",
                record.id, collection, e
            ))
        })?;

        if document.id() != record.id {
            return Err(SyncError::parse(format!(
                "record '{}' carries mismatched document id '{}'",
                record.id,
                document.id()
            )));
        }
        document.validate().map_err(SyncError::parse)?;

        Ok(document)
    }

    /// Decode a full page of source records.
    ///
    /// Any undecodable record fails the page; the batch path has no partial
    /// success and the caller re-drives from the last successful cursor.
    #[instrument(skip(self, records), fields(collection = %collection, record_count = records.len()))]
    pub fn process_page(
        &self,
        collection: Collection,
        records: &[SourceRecord],
    ) -> Result<Vec<SearchDocument>, SyncError> {
        let documents = records
            .iter()
            .map(|record| self.decode_record(collection, record))
            .collect::<Result<Vec<_>, SyncError>>()?;

        debug!(decoded = documents.len(), "Decoded source page");
        Ok(documents)
    }

    /// Process a batch of change events into index operations.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub fn process_changes(
        &self,
        events: Vec<ChangeEvent>,
    ) -> Result<Vec<ProcessedEvent>, SyncError> {
        let mut processed = Vec::with_capacity(events.len());

        for event in events {
            processed.push(self.process_change(event)?);
        }

        debug!(processed_count = processed.len(), "Processed change batch");
        Ok(processed)
    }

    /// Process a single change event.
    ///
    /// A write (create or update, deliberately indistinguishable) becomes an
    /// upsert of the current document state; a delete becomes a
    /// delete-by-id. No tombstoning.
    fn process_change(&self, event: ChangeEvent) -> Result<ProcessedEvent, SyncError> {
        match event.change {
            ChangeKind::Written(data) => {
                let record = SourceRecord {
                    id: event.document_id,
                    data,
                };
                let document = self.decode_record(event.collection, &record)?;
                Ok(ProcessedEvent::Upsert(document))
            }
            ChangeKind::Deleted => Ok(ProcessedEvent::Delete {
                collection: event.collection,
                document_id: event.document_id,
            }),
        }
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn breed_record(id: &str) -> SourceRecord {
        SourceRecord {
            id: id.to_string(),
            data: json!({
                "id": id,
                "name": "Whippet",
                "group": "hound",
                "size": "medium"
            }),
        }
    }

    #[test]
    fn test_decode_breed_record() {
        let processor = DocumentProcessor::new();
        let document = processor
            .decode_record(Collection::Breeds, &breed_record("breed-0001"))
            .unwrap();
        assert_eq!(document.id(), "breed-0001");
        assert_eq!(document.collection(), Collection::Breeds);
    }

    #[test]
    fn test_decode_rejects_mismatched_join_key() {
        let processor = DocumentProcessor::new();
        let record = SourceRecord {
            id: "breed-0001".to_string(),
            data: json!({"id": "breed-9999", "name": "Whippet"}),
        };
        let result = processor.decode_record(Collection::Breeds, &record);
        assert!(matches!(result, Err(SyncError::ParseError(_))));
    }

    #[test]
    fn test_decode_rejects_missing_required_field() {
        let processor = DocumentProcessor::new();
        let record = SourceRecord {
            id: "kennel-1".to_string(),
            // name is required on kennels
            data: json!({"id": "kennel-1", "location": "Austin, TX"}),
        };
        let result = processor.decode_record(Collection::Kennels, &record);
        assert!(matches!(result, Err(SyncError::ParseError(_))));
    }

    #[test]
    fn test_process_page_fails_whole_page_on_bad_record() {
        let processor = DocumentProcessor::new();
        let records = vec![
            breed_record("breed-0001"),
            SourceRecord {
                id: "breed-0002".to_string(),
                data: json!({"id": "breed-0002"}),
            },
        ];
        assert!(processor.process_page(Collection::Breeds, &records).is_err());
    }

    #[test]
    fn test_written_change_becomes_upsert() {
        let processor = DocumentProcessor::new();
        let event = ChangeEvent::written(
            Collection::Listings,
            "listing-3",
            json!({"id": "listing-3", "title": "Corgi litter", "status": "active"}),
        );
        let processed = processor.process_changes(vec![event]).unwrap();
        assert!(matches!(processed[0], ProcessedEvent::Upsert(_)));
    }

    #[test]
    fn test_delete_change_becomes_delete() {
        let processor = DocumentProcessor::new();
        let event = ChangeEvent::deleted(Collection::Kennels, "kennel-5");
        let processed = processor.process_changes(vec![event]).unwrap();
        match &processed[0] {
            ProcessedEvent::Delete {
                collection,
                document_id,
            } => {
                assert_eq!(*collection, Collection::Kennels);
                assert_eq!(document_id, "kennel-5");
            }
            other => panic!("expected delete, got {other:?}"),
        }
    }
}
