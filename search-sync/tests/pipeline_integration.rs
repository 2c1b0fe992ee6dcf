//! Integration tests for the sync pipeline.
//!
//! These tests use the real FullSyncDriver and Orchestrator but mock
//! dependencies (ChangeConsumer and SearchIndexProvider) to ensure reliable
//! testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use chrono::{DateTime, Utc};
use search_sync::consumer::{ChangeConsumer, ChangeEvent, StreamMessage};
use search_sync::driver::{FullSyncDriver, ProgressEvent, ProgressTotal};
use search_sync::errors::SyncError;
use search_sync::loader::SearchLoader;
use search_sync::orchestrator::Orchestrator;
use search_sync::processor::DocumentProcessor;
use search_sync_repository::{
    BatchOperationResult, BatchOperationSummary, IndexStats, MemorySourceStore, SearchIndexError,
    SearchIndexProvider,
};
use search_sync_shared::{Collection, SearchDocument};
use serde_json::json;

// Mock consumer that replays a fixed list of change events
struct MockConsumer {
    events_to_send: Vec<ChangeEvent>,
    last_ack_success: Mutex<Option<bool>>,
}

impl MockConsumer {
    fn new(events: Vec<ChangeEvent>) -> Self {
        Self {
            events_to_send: events,
            last_ack_success: Mutex::new(None),
        }
    }

    fn last_ack_success(&self) -> Option<bool> {
        *self.last_ack_success.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl ChangeConsumer for MockConsumer {
    fn subscribe(&self) -> Result<(), SyncError> {
        Ok(())
    }

    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), SyncError> {
        let events = self.events_to_send.clone();
        let offsets = vec![("test-topic".to_string(), 0, 1i64)];

        let _ = sender.send(StreamMessage::Events { events, offsets }).await;

        // Wait for the acknowledgment before ending the stream, so tests can
        // observe the outcome.
        tokio::select! {
            _ = shutdown.recv() => {}
            Some(StreamMessage::Acknowledgment { success, .. }) = ack_receiver.recv() => {
                *self.last_ack_success.lock().unwrap() = Some(success);
            }
        }

        let _ = sender.send(StreamMessage::End).await;
        Ok(())
    }
}

// Map-backed mock index: documents keyed by collection and join key, with
// the time they were last written.
struct MockIndexProvider {
    indexed: Mutex<HashMap<Collection, BTreeMap<String, (SearchDocument, DateTime<Utc>)>>>,
}

impl MockIndexProvider {
    fn new() -> Self {
        Self {
            indexed: Mutex::new(HashMap::new()),
        }
    }

    fn document_count(&self, collection: Collection) -> usize {
        self.indexed
            .lock()
            .unwrap()
            .get(&collection)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    fn get(&self, collection: Collection, id: &str) -> Option<(SearchDocument, DateTime<Utc>)> {
        self.indexed
            .lock()
            .unwrap()
            .get(&collection)
            .and_then(|m| m.get(id))
            .cloned()
    }
}

#[async_trait::async_trait]
impl SearchIndexProvider for MockIndexProvider {
    async fn ensure_index_exists(&self, _collection: Collection) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn upsert_document(&self, document: &SearchDocument) -> Result<(), SearchIndexError> {
        self.indexed
            .lock()
            .unwrap()
            .entry(document.collection())
            .or_default()
            .insert(document.id().to_string(), (document.clone(), Utc::now()));
        Ok(())
    }

    async fn bulk_upsert_documents(
        &self,
        documents: &[SearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut results = Vec::with_capacity(documents.len());
        for document in documents {
            self.upsert_document(document).await?;
            results.push(BatchOperationResult {
                document_id: document.id().to_string(),
                collection: document.collection(),
                success: true,
                error: None,
            });
        }
        Ok(BatchOperationSummary {
            total: documents.len(),
            succeeded: documents.len(),
            failed: 0,
            results,
        })
    }

    async fn delete_document(
        &self,
        collection: Collection,
        document_id: &str,
    ) -> Result<(), SearchIndexError> {
        if let Some(map) = self.indexed.lock().unwrap().get_mut(&collection) {
            map.remove(document_id);
        }
        Ok(())
    }

    async fn index_stats(&self, collection: Collection) -> Result<IndexStats, SearchIndexError> {
        Ok(IndexStats {
            documents: self.document_count(collection) as u64,
        })
    }
}

fn breed_record(n: usize) -> (String, serde_json::Value) {
    let id = format!("breed-{n:04}");
    let record = json!({
        "id": id,
        "name": format!("Breed {n}"),
        "group": "herding",
        "size": "medium",
    });
    (id, record)
}

fn seeded_breeds_store(count: usize) -> Arc<MemorySourceStore> {
    let store = MemorySourceStore::new();
    for n in 1..=count {
        let (id, record) = breed_record(n);
        store.insert(Collection::Breeds, id, record);
    }
    Arc::new(store)
}

fn orchestrator_with(
    events: Vec<ChangeEvent>,
) -> (Orchestrator, Arc<MockConsumer>, Arc<MockIndexProvider>) {
    let consumer = Arc::new(MockConsumer::new(events));
    let provider = Arc::new(MockIndexProvider::new());
    let loader = SearchLoader::new(provider.clone());
    let orchestrator = Orchestrator::new(consumer.clone(), DocumentProcessor::new(), loader);
    (orchestrator, consumer, provider)
}

#[tokio::test]
async fn test_full_sync_pages_collection_to_exhaustion() {
    // 250 breeds at page size 100: two full pages plus a final short page,
    // so exactly three reads and no trailing empty read.
    let store = seeded_breeds_store(250);
    let provider = Arc::new(MockIndexProvider::new());
    let mut driver = FullSyncDriver::with_page_size(store, provider.clone(), 100);

    let (progress_tx, mut progress_rx) = mpsc::channel(16);
    let report = driver.run(Some(progress_tx)).await.unwrap();

    let breeds = report
        .collections
        .iter()
        .find(|s| s.collection == Collection::Breeds)
        .unwrap();
    assert_eq!(breeds.pages_read, 3);
    assert_eq!(breeds.documents_synced, 250);
    assert_eq!(report.total_documents(), 250);

    assert_eq!(provider.document_count(Collection::Breeds), 250);

    // Every indexed document carries a sync timestamp.
    for n in [1, 100, 101, 250] {
        let (id, _) = breed_record(n);
        let (doc, synced_at) = provider.get(Collection::Breeds, &id).unwrap();
        assert_eq!(doc.id(), id);
        assert!(synced_at <= Utc::now());
    }

    // Progress is reported after every applied page, total unknown.
    let mut synced_counts = Vec::new();
    while let Ok(event) = progress_rx.try_recv() {
        assert_eq!(event.collection, Collection::Breeds);
        assert_eq!(event.total, ProgressTotal::Unknown);
        synced_counts.push(event.synced);
    }
    assert_eq!(synced_counts, vec![100, 200, 250]);
}

#[tokio::test]
async fn test_exact_page_multiple_costs_one_extra_read() {
    // 200 breeds at page size 100: both pages come back full, so the reader
    // cannot tell the collection is exhausted until a third, empty read.
    let store = seeded_breeds_store(200);
    let provider = Arc::new(MockIndexProvider::new());
    let mut driver = FullSyncDriver::with_page_size(store, provider.clone(), 100);

    let report = driver.run(None).await.unwrap();

    let breeds = report
        .collections
        .iter()
        .find(|s| s.collection == Collection::Breeds)
        .unwrap();
    assert_eq!(breeds.pages_read, 3);
    assert_eq!(breeds.documents_synced, 200);
}

#[tokio::test]
async fn test_repeat_upserts_converge_to_latest_value() {
    // Two change events for the same document id must leave one index entry
    // holding the later values.
    let (mut orchestrator, consumer, provider) = orchestrator_with(vec![
        ChangeEvent::written(
            Collection::Breeds,
            "breed-0001",
            json!({"id": "breed-0001", "name": "Beagle"}),
        ),
        ChangeEvent::written(
            Collection::Breeds,
            "breed-0001",
            json!({"id": "breed-0001", "name": "Beagle Harrier", "group": "hound"}),
        ),
    ]);

    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .unwrap();

    assert_eq!(consumer.last_ack_success(), Some(true));
    assert_eq!(provider.document_count(Collection::Breeds), 1);

    let (doc, _) = provider.get(Collection::Breeds, "breed-0001").unwrap();
    match doc {
        SearchDocument::Breed(breed) => {
            assert_eq!(breed.name, "Beagle Harrier");
            assert_eq!(breed.group.as_deref(), Some("hound"));
        }
        other => panic!("expected a breed document, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_resync_never_deletes() {
    // A record removed from the source between resyncs stays in the index
    // until a delete change event arrives: the batch path only upserts.
    let store = seeded_breeds_store(2);
    let provider = Arc::new(MockIndexProvider::new());

    let mut driver = FullSyncDriver::with_page_size(store.clone(), provider.clone(), 100);
    driver.run(None).await.unwrap();
    assert_eq!(provider.document_count(Collection::Breeds), 2);

    store.remove(Collection::Breeds, "breed-0002");
    let mut driver = FullSyncDriver::with_page_size(store.clone(), provider.clone(), 100);
    driver.run(None).await.unwrap();

    // Still two entries: the resync does not reconcile deletions.
    assert_eq!(provider.document_count(Collection::Breeds), 2);
    assert!(provider.get(Collection::Breeds, "breed-0002").is_some());

    // The delete event is what removes it.
    let consumer = Arc::new(MockConsumer::new(vec![ChangeEvent::deleted(
        Collection::Breeds,
        "breed-0002",
    )]));
    let loader = SearchLoader::new(provider.clone());
    let mut orchestrator = Orchestrator::new(consumer, DocumentProcessor::new(), loader);
    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .unwrap();

    assert_eq!(provider.document_count(Collection::Breeds), 1);
    assert!(provider.get(Collection::Breeds, "breed-0002").is_none());
}

#[tokio::test]
async fn test_change_and_batch_paths_share_one_index_entry() {
    // The change path and the batch path address documents by the same join
    // key, so syncing the same record through both leaves one entry.
    let store = seeded_breeds_store(1);
    let provider = Arc::new(MockIndexProvider::new());

    let mut driver = FullSyncDriver::with_page_size(store, provider.clone(), 100);
    driver.run(None).await.unwrap();

    let (_, record) = breed_record(1);
    let consumer = Arc::new(MockConsumer::new(vec![ChangeEvent::written(
        Collection::Breeds,
        "breed-0001",
        record,
    )]));
    let loader = SearchLoader::new(provider.clone());
    let mut orchestrator = Orchestrator::new(consumer, DocumentProcessor::new(), loader);
    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .unwrap();

    assert_eq!(provider.document_count(Collection::Breeds), 1);
}

#[tokio::test]
async fn test_written_then_deleted_in_one_batch_stays_deleted() {
    // A document created and deleted within the same change batch must end
    // up absent: the buffered upsert may not be applied after the delete.
    let (mut orchestrator, consumer, provider) = orchestrator_with(vec![
        ChangeEvent::written(
            Collection::Breeds,
            "breed-0001",
            json!({"id": "breed-0001", "name": "Beagle"}),
        ),
        ChangeEvent::deleted(Collection::Breeds, "breed-0001"),
    ]);

    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .unwrap();

    assert_eq!(consumer.last_ack_success(), Some(true));
    assert_eq!(provider.document_count(Collection::Breeds), 0);
    assert!(provider.get(Collection::Breeds, "breed-0001").is_none());
}

#[tokio::test]
async fn test_undecodable_change_batch_is_acked_as_failed() {
    // A record whose embedded id disagrees with the event's document id fails
    // processing; the batch is acknowledged as failed and nothing is indexed.
    let (mut orchestrator, consumer, provider) = orchestrator_with(vec![ChangeEvent::written(
        Collection::Breeds,
        "breed-0001",
        json!({"id": "breed-9999", "name": "Impostor"}),
    )]);

    timeout(Duration::from_secs(5), orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .unwrap();

    assert_eq!(consumer.last_ack_success(), Some(false));
    assert_eq!(provider.document_count(Collection::Breeds), 0);
}

#[tokio::test]
async fn test_progress_event_total_is_explicit() {
    // The progress payload distinguishes "unknown total" from a real count
    // instead of overloading a sentinel number.
    let event = ProgressEvent {
        collection: Collection::Listings,
        synced: 42,
        total: ProgressTotal::Unknown,
    };
    assert_ne!(event.total, ProgressTotal::Known(0));
}
