//! OpenSearch index configuration and mappings.
//!
//! One index per synchronized collection. Each index definition declares the
//! searchable text fields (search_as_you_type), the filterable categorical
//! fields (keyword), and the sortable numeric fields for that collection,
//! plus the two synchronization timestamp fields maintained by the writer.

use search_sync_shared::Collection;
use serde_json::{json, Map, Value};

/// Configuration for the search indices.
#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    /// The version number appended to physical index names
    /// (e.g. 0 for "doghouse-breeds_v0"). Operations always go through the
    /// unversioned alias.
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    /// The versioned physical index name for a collection.
    pub fn versioned_name(&self, collection: Collection) -> String {
        versioned_index_name(collection, self.version)
    }
}

/// Get the versioned index name for a collection.
pub fn versioned_index_name(collection: Collection, version: u32) -> String {
    format!("{}_v{}", collection.index_alias(), version)
}

/// Field mapping for autocomplete-style search text.
fn searchable() -> Value {
    json!({
        "type": "search_as_you_type",
        "fields": {
            "raw": {
                "type": "keyword"
            }
        }
    })
}

/// Field mapping for exact-match filtering.
fn filterable() -> Value {
    json!({ "type": "keyword" })
}

/// Get the index settings and mappings for one collection's index.
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 1 replica for redundancy
pub fn index_settings(collection: Collection) -> Value {
    let mut properties = Map::new();
    properties.insert("id".to_string(), filterable());
    properties.insert("synced_at".to_string(), json!({ "type": "date" }));
    properties.insert("first_synced_at".to_string(), json!({ "type": "date" }));

    match collection {
        Collection::Breeds => {
            properties.insert("name".to_string(), searchable());
            properties.insert("description".to_string(), searchable());
            properties.insert("group".to_string(), filterable());
            properties.insert("size".to_string(), filterable());
            properties.insert("care_requirements".to_string(), filterable());
            properties.insert(
                "traits".to_string(),
                json!({
                    "properties": {
                        "energy": { "type": "byte" },
                        "friendliness": { "type": "byte" },
                        "grooming": { "type": "byte" },
                        "trainability": { "type": "byte" }
                    }
                }),
            );
        }
        Collection::Kennels => {
            properties.insert("name".to_string(), searchable());
            properties.insert("location".to_string(), searchable());
            properties.insert("owner_id".to_string(), filterable());
            properties.insert("services".to_string(), filterable());
        }
        Collection::Listings => {
            properties.insert("title".to_string(), searchable());
            properties.insert("description".to_string(), searchable());
            properties.insert("breed_name".to_string(), searchable());
            properties.insert("kennel_name".to_string(), searchable());
            properties.insert("breed_id".to_string(), filterable());
            properties.insert("kennel_id".to_string(), filterable());
            properties.insert("location".to_string(), filterable());
            properties.insert("status".to_string(), filterable());
            properties.insert("price".to_string(), json!({ "type": "double" }));
        }
    }

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": properties
        }
    })
}
