//! Search Sync Main Entry Point
//!
//! This is the main binary for the Doghouse marketplace search sync service.
//! Depending on the configured run mode it resyncs every collection from the
//! source store, consumes document change events from Kafka, or does both.

use dotenv::dotenv;
use search_sync::driver::{ProgressEvent, ProgressTotal};
use search_sync::{Dependencies, ServiceError};
use std::env;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), ServiceError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_sync=info,search_sync_repository=info"));

    let json_format = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

/// Log progress events emitted by the full-sync driver.
async fn log_progress(mut receiver: mpsc::Receiver<ProgressEvent>) {
    while let Some(event) = receiver.recv().await {
        match event.total {
            ProgressTotal::Known(total) => {
                info!(
                    collection = %event.collection,
                    synced = event.synced,
                    total = total,
                    "Full sync progress"
                );
            }
            ProgressTotal::Unknown => {
                info!(
                    collection = %event.collection,
                    synced = event.synced,
                    "Full sync progress"
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting Doghouse search sync");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    if let Some(mut driver) = deps.driver.take() {
        let (progress_tx, progress_rx) = mpsc::channel(64);
        let progress_task = tokio::spawn(log_progress(progress_rx));

        match driver.run(Some(progress_tx)).await {
            Ok(report) => {
                info!(
                    total_documents = report.total_documents(),
                    "Full sync completed successfully"
                );
            }
            Err(e) => {
                error!(error = %e, "Full sync failed");
                return Err(e.into());
            }
        }

        let _ = progress_task.await;
    }

    if let Some(mut orchestrator) = deps.orchestrator.take() {
        match orchestrator.run().await {
            Ok(()) => {
                info!("Change sync completed successfully");
            }
            Err(e) => {
                error!(error = %e, "Change sync failed");
                return Err(e.into());
            }
        }
    }

    Ok(())
}
