//! HTTP API for usage predictions, dashboard data, and Prometheus metrics.
//!
//! Routes:
//! - `GET  /api/status`: liveness plus model readiness
//! - `GET  /api/usage`: 24-hour mock usage chart
//! - `POST /api/predict`: usage prediction from user inputs
//! - `GET  /api/recommendations`: seeded energy-saving tips
//! - `POST /api/system_status`: rule-based streetlight/AC state
//! - `POST /api/optimize`: simulated load shedding
//! - `GET  /metrics`: Prometheus exposition

mod handlers;
mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use energy_lib::{EnergyMetrics, EnergyPredictor, ModelStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub store: Arc<ModelStore>,
    pub predictor: EnergyPredictor,
    pub metrics: EnergyMetrics,
    /// Set once the startup warm-up has materialized the artifact
    pub model_ready: AtomicBool,
    /// Seeded RNG driving the recommendations endpoint
    pub recommendation_rng: Mutex<StdRng>,
}

impl AppState {
    pub fn new(store: Arc<ModelStore>, metrics: EnergyMetrics, recommendation_seed: u64) -> Self {
        Self {
            predictor: EnergyPredictor::new(Arc::clone(&store)),
            store,
            metrics,
            model_ready: AtomicBool::new(false),
            recommendation_rng: Mutex::new(StdRng::seed_from_u64(recommendation_seed)),
        }
    }
}

/// Eagerly materializes the model artifact so the first request does not pay
/// the training cost.
///
/// Failure is logged, not fatal: the store attempts again on the next
/// prediction.
pub fn ensure_model_ready(state: &AppState) {
    match state.store.load_or_train() {
        Ok(_) => {
            state.model_ready.store(true, Ordering::Relaxed);
            state.metrics.set_model_ready(true);
            info!(location = %state.store.location(), "model ready");
        }
        Err(err) => {
            state.metrics.set_model_ready(false);
            warn!(error = %err, "model warm-up failed");
        }
    }
    state.metrics.sync_store_stats(&state.store.stats());
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(handlers::get_status))
        .route("/api/usage", get(handlers::get_usage))
        .route("/api/predict", post(handlers::post_predict))
        .route("/api/recommendations", get(handlers::get_recommendations))
        .route("/api/system_status", post(handlers::post_system_status))
        .route("/api/optimize", post(handlers::post_optimize))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
