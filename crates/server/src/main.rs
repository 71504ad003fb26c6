//! GreenGrid server - building energy prediction service
//!
//! Serves usage predictions, dashboard chart data, and grid recommendations
//! over HTTP, backed by a lazily trained linear regression model.

use anyhow::Result;
use energy_lib::{EnergyMetrics, FsStorage, ModelStore, TrainingConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use greengrid_server::api;
use greengrid_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting greengrid-server");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        api_port = config.api_port,
        model_path = %config.model_path,
        "Server configured"
    );

    // Wire the model lifecycle: file-backed store, lazy predictor
    let store = Arc::new(ModelStore::new(
        FsStorage::new(&config.model_path),
        TrainingConfig {
            sample_count: config.training_samples,
            seed: config.training_seed,
        },
    ));

    // Initialize metrics
    let metrics = EnergyMetrics::new();

    // Create shared application state
    let state = Arc::new(api::AppState::new(
        store,
        metrics,
        config.recommendation_seed,
    ));

    // Materialize the model before accepting traffic
    api::ensure_model_ready(&state);

    // Start the API server
    let _api_handle = tokio::spawn(api::serve(config.api_port, state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
