//! Dependency initialization and wiring for the sync service.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::consumer::KafkaChangeConsumer;
use crate::driver::FullSyncDriver;
use crate::loader::SearchLoader;
use crate::orchestrator::Orchestrator;
use crate::processor::DocumentProcessor;
use crate::reader::DEFAULT_PAGE_SIZE;
use crate::ServiceError;
use search_sync_repository::opensearch::IndexConfig;
use search_sync_repository::{
    OpenSearchProvider, PostgresSourceStore, SearchIndexProvider, SearchIndexService, SourceStore,
};
use search_sync_shared::Collection;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "search-sync";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Parse the `SYNC_PAGE_SIZE` value.
///
/// The batch reader requires a positive page size, so a zero or unparseable
/// value is a configuration error rather than a panic deeper in the pipeline.
fn parse_page_size(raw: &str) -> Result<usize, ServiceError> {
    match raw.parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ServiceError::config(format!(
            "SYNC_PAGE_SIZE must be a positive integer, got '{raw}'"
        ))),
    }
}

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        match env::var("OPENSEARCH_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// How the service should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Resync every collection from the source store once, then exit.
    Full,
    /// Consume change events until shutdown.
    Incremental,
    /// Full resync first, then switch to consuming change events.
    FullThenIncremental,
}

impl RunMode {
    /// Parse the run mode from the `SYNC_MODE` environment variable.
    ///
    /// Valid values: "full", "incremental", "full-then-incremental"
    /// (case-insensitive). Defaults to "incremental" if not set or invalid.
    pub fn from_env() -> Self {
        match env::var("SYNC_MODE")
            .unwrap_or_else(|_| "incremental".to_string())
            .to_lowercase()
            .as_str()
        {
            "full" => Self::Full,
            "incremental" => Self::Incremental,
            "full-then-incremental" | "full_then_incremental" => Self::FullThenIncremental,
            _ => {
                warn!("Invalid SYNC_MODE, defaulting to 'incremental'");
                Self::Incremental
            }
        }
    }

    /// Whether this mode runs a full resync.
    pub fn runs_full_sync(self) -> bool {
        matches!(self, Self::Full | Self::FullThenIncremental)
    }

    /// Whether this mode consumes change events.
    pub fn runs_incremental(self) -> bool {
        matches!(self, Self::Incremental | Self::FullThenIncremental)
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// How the service was asked to run.
    pub run_mode: RunMode,
    /// Full-sync driver, present when the run mode includes a full resync.
    pub driver: Option<FullSyncDriver>,
    /// Change-event orchestrator, present when the run mode consumes changes.
    pub orchestrator: Option<Orchestrator>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SYNC_MODE`: "full", "incremental", or "full-then-incremental" (default: incremental)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_VERSION`: Physical index version number (default: 0)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `DATABASE_URL`: Source store connection string (required for full modes)
    /// - `SYNC_PAGE_SIZE`: Batch reader page size (default: 100)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID (default: search-sync)
    pub async fn new() -> Result<Self, ServiceError> {
        let run_mode = RunMode::from_env();
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let index_version = env::var("INDEX_VERSION")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);

        info!(
            run_mode = ?run_mode,
            opensearch_url = %opensearch_url,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            index_version = index_version,
            "Initializing dependencies"
        );

        let index_config = IndexConfig::new(index_version);

        let provider: Arc<dyn SearchIndexProvider> = Arc::new(
            Self::connect_to_opensearch(
                &opensearch_url,
                index_config,
                connection_mode,
                Duration::from_secs(retry_interval),
            )
            .await?,
        );

        info!("OpenSearch connection established");

        // Bootstrap every collection index. Per-index failures are isolated:
        // a collection whose index cannot be created is logged and skipped,
        // the remaining indices still come up.
        let service = SearchIndexService::new(Arc::clone(&provider));
        let init_results = service.initialize_indexes().await;
        let failed = init_results.iter().filter(|r| !r.success).count();
        if failed == init_results.len() {
            return Err(ServiceError::config(
                "Failed to initialize any search index",
            ));
        }
        if failed > 0 {
            warn!(
                failed = failed,
                total = init_results.len(),
                "Some search indices failed to initialize"
            );
        }

        for collection in Collection::ALL {
            match provider.index_stats(collection).await {
                Ok(stats) => info!(
                    index = collection.index_alias(),
                    documents = stats.documents,
                    "Search index stats"
                ),
                Err(e) => warn!(
                    index = collection.index_alias(),
                    error = %e,
                    "Could not read search index stats"
                ),
            }
        }

        let driver = if run_mode.runs_full_sync() {
            let database_url = env::var("DATABASE_URL").map_err(|_| {
                ServiceError::config("DATABASE_URL is required when SYNC_MODE includes a full sync")
            })?;
            let page_size = match env::var("SYNC_PAGE_SIZE") {
                Ok(raw) => parse_page_size(&raw)?,
                Err(_) => DEFAULT_PAGE_SIZE,
            };

            let store: Arc<dyn SourceStore> = Arc::new(
                PostgresSourceStore::connect(&database_url)
                    .await
                    .map_err(|e| {
                        ServiceError::config(format!("Failed to connect to source store: {e}"))
                    })?,
            );

            info!(page_size = page_size, "Source store connection established");

            Some(FullSyncDriver::with_page_size(
                store,
                Arc::clone(&provider),
                page_size,
            ))
        } else {
            None
        };

        let orchestrator = if run_mode.runs_incremental() {
            let kafka_broker =
                env::var("KAFKA_BROKER").unwrap_or_else(|_| DEFAULT_KAFKA_BROKER.to_string());
            let kafka_group_id =
                env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| DEFAULT_KAFKA_GROUP_ID.to_string());

            let consumer = KafkaChangeConsumer::new(&kafka_broker, &kafka_group_id)
                .map_err(|e| ServiceError::config(format!("Failed to create Kafka consumer: {e}")))?;

            info!(
                kafka_broker = %kafka_broker,
                kafka_group_id = %kafka_group_id,
                "Kafka consumer created"
            );

            let processor = DocumentProcessor::new();
            let loader = SearchLoader::new(Arc::clone(&provider));

            Some(Orchestrator::new(Arc::new(consumer), processor, loader))
        } else {
            None
        };

        Ok(Self {
            run_mode,
            driver,
            orchestrator,
        })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, ServiceError> {
        loop {
            match OpenSearchProvider::new(url, index_config).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(ServiceError::config(format!(
                            "Failed to connect to OpenSearch: {e}"
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
