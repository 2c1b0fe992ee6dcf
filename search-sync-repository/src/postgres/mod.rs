//! Postgres implementation of the source store.
//!
//! The marketplace backend keeps each synchronized collection in a table of
//! the same name with an `id TEXT PRIMARY KEY` and the document body in a
//! `data JSONB` column. Pagination seeks on the primary key, so the ascending
//! ordering contract of `SourceStore` comes directly from the index.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::errors::SourceStoreError;
use crate::interfaces::SourceStore;
use crate::types::SourceRecord;
use search_sync_shared::Collection;

/// Maximum pooled connections to the source database.
const MAX_CONNECTIONS: u32 = 5;

/// Postgres-backed source store.
pub struct PostgresSourceStore {
    pool: PgPool,
}

impl PostgresSourceStore {
    /// Connect to the source database.
    ///
    /// # Arguments
    ///
    /// * `database_url` - Postgres connection string
    pub async fn connect(database_url: &str) -> Result<Self, SourceStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| SourceStoreError::connection(e.to_string()))?;

        info!("Connected to source database");
        Ok(Self { pool })
    }

    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceStore for PostgresSourceStore {
    async fn fetch_after(
        &self,
        collection: Collection,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SourceRecord>, SourceStoreError> {
        // Table names come from the Collection enum, never from input.
        let table = collection.name();

        let rows = match cursor {
            Some(cursor) => {
                let query =
                    format!("SELECT id, data FROM {table} WHERE id > $1 ORDER BY id ASC LIMIT $2");
                sqlx::query(&query)
                    .bind(cursor)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!("SELECT id, data FROM {table} ORDER BY id ASC LIMIT $1");
                sqlx::query(&query)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| SourceStoreError::query(e.to_string()))?;

        let records = rows
            .into_iter()
            .map(|row| {
                let id: String = row
                    .try_get("id")
                    .map_err(|e| SourceStoreError::decode(e.to_string()))?;
                let data: serde_json::Value = row
                    .try_get("data")
                    .map_err(|e| SourceStoreError::decode(e.to_string()))?;
                Ok(SourceRecord { id, data })
            })
            .collect::<Result<Vec<_>, SourceStoreError>>()?;

        debug!(
            collection = %collection,
            cursor = cursor.unwrap_or("<start>"),
            fetched = records.len(),
            "Fetched source page"
        );

        Ok(records)
    }
}
