//! Observability infrastructure for the energy service
//!
//! Prometheus metrics covering prediction latency and volume, model
//! trainings, artifact loads, and model readiness. Structured logging is
//! plain `tracing`; the binary installs the JSON subscriber.

use prometheus::{register_histogram, register_int_gauge, Histogram, IntGauge};
use std::sync::OnceLock;

use crate::store::StoreStats;

/// Histogram buckets for latency measurements, in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance, registered on first handle creation
static GLOBAL_METRICS: OnceLock<EnergyMetricsInner> = OnceLock::new();

/// Holds the registered Prometheus instruments
struct EnergyMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_served: IntGauge,
    prediction_errors: IntGauge,
    model_trainings: IntGauge,
    artifact_loads: IntGauge,
    model_ready: IntGauge,
}

impl EnergyMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "greengrid_prediction_latency_seconds",
                "Time spent producing a usage prediction, including model loading",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_served: register_int_gauge!(
                "greengrid_predictions_served_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_served"),

            prediction_errors: register_int_gauge!(
                "greengrid_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors"),

            model_trainings: register_int_gauge!(
                "greengrid_model_trainings_total",
                "Models trained from synthetic data by this process"
            )
            .expect("Failed to register model_trainings"),

            artifact_loads: register_int_gauge!(
                "greengrid_artifact_loads_total",
                "Models decoded from the persisted artifact by this process"
            )
            .expect("Failed to register artifact_loads"),

            model_ready: register_int_gauge!(
                "greengrid_model_ready",
                "Whether a fitted model is materialized and loadable (1) or not (0)"
            )
            .expect("Failed to register model_ready"),
        }
    }
}

/// Energy service metrics for Prometheus exposition
///
/// A cheap cloneable handle; every clone records into the same globally
/// registered instruments.
#[derive(Clone)]
pub struct EnergyMetrics {
    // Just a marker - the data lives in the global instance
    _private: (),
}

impl Default for EnergyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EnergyMetrics {
    /// Creates a handle, registering the global metrics on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EnergyMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EnergyMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a prediction latency observation
    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Increment the served-predictions counter
    pub fn inc_predictions_served(&self) {
        self.inner().predictions_served.inc();
    }

    /// Increment the prediction-errors counter
    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    /// Mirror the store's training/load counters into the exposition
    pub fn sync_store_stats(&self, stats: &StoreStats) {
        self.inner().model_trainings.set(stats.trainings as i64);
        self.inner().artifact_loads.set(stats.artifact_loads as i64);
    }

    /// Update the model-ready gauge
    pub fn set_model_ready(&self, ready: bool) {
        self.inner().model_ready.set(i64::from(ready));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_records_without_panicking() {
        // The Prometheus registry is process-global, so this test only
        // verifies the handle wiring, not registration isolation.
        let metrics = EnergyMetrics::new();

        metrics.observe_prediction_latency(0.002);
        metrics.inc_predictions_served();
        metrics.inc_prediction_errors();
        metrics.set_model_ready(true);
        metrics.sync_store_stats(&StoreStats {
            trainings: 1,
            artifact_loads: 3,
        });
    }
}
