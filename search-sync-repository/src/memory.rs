//! In-memory source store.
//!
//! Backs the pipeline tests and local development runs. Records live in a
//! `BTreeMap` per collection, which gives the ascending-id pagination
//! contract for free.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::RwLock;

use crate::errors::SourceStoreError;
use crate::interfaces::SourceStore;
use crate::types::SourceRecord;
use search_sync_shared::Collection;

/// Source store keeping all records in memory.
#[derive(Default)]
pub struct MemorySourceStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, serde_json::Value>>>,
}

impl MemorySourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, collection: Collection, id: impl Into<String>, data: serde_json::Value) {
        let mut collections = self.collections.write().expect("store lock poisoned");
        collections.entry(collection).or_default().insert(id.into(), data);
    }

    /// Remove a record, returning whether it existed.
    pub fn remove(&self, collection: Collection, id: &str) -> bool {
        let mut collections = self.collections.write().expect("store lock poisoned");
        collections
            .get_mut(&collection)
            .map(|records| records.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Number of records in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        let collections = self.collections.read().expect("store lock poisoned");
        collections
            .get(&collection)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    /// Whether a collection holds no records.
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl SourceStore for MemorySourceStore {
    async fn fetch_after(
        &self,
        collection: Collection,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SourceRecord>, SourceStoreError> {
        let collections = self.collections.read().expect("store lock poisoned");
        let Some(records) = collections.get(&collection) else {
            return Ok(vec![]);
        };

        let lower = match cursor {
            Some(cursor) => Bound::Excluded(cursor.to_string()),
            None => Bound::Unbounded,
        };

        Ok(records
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(id, data)| SourceRecord {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }
}
