//! Request and response types for the API endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use energy_lib::{EnergyError, PredictionInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// `GET /api/status` response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub model_ready: bool,
}

/// `POST /api/predict` request body.
///
/// Fields are loose JSON values so that numeric strings and booleans can be
/// coerced the same way a dynamically-typed client would expect; absent
/// fields fall back to defaults (hour 12, temperature 30.0, weekday).
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    pub hour: Option<Value>,
    pub temperature: Option<Value>,
    pub is_weekend: Option<Value>,
}

/// `POST /api/predict` response, echoing the coerced inputs.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_usage: f64,
    pub inputs: PredictionInput,
}

/// One row of the mock historical usage chart.
#[derive(Debug, Serialize)]
pub struct UsageRow {
    /// Hour label, e.g. "14:00"
    pub hour: String,
    pub usage: f64,
    pub temperature: f64,
}

/// A single energy-saving tip.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub id: u32,
    pub text: String,
    pub category: String,
}

/// `GET /api/recommendations` response.
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    /// Simulated load context: "high", "medium", or "low"
    pub context: String,
    pub recommendations: Vec<Recommendation>,
}

/// `POST /api/system_status` request body.
#[derive(Debug, Default, Deserialize)]
pub struct SystemStatusRequest {
    pub hour: Option<Value>,
    pub temperature: Option<Value>,
}

/// `POST /api/system_status` response.
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub streetlights: String,
    pub ac_system: String,
    pub message: String,
}

/// `POST /api/optimize` response.
#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub status: String,
    pub actions: Vec<String>,
    pub savings_estimated: String,
}

/// Error body shared by all failing routes.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps library errors onto HTTP status codes.
///
/// Invalid input is the client's fault (400); degenerate training data is an
/// internal failure (500); unusable storage means the service cannot answer
/// right now (503).
#[derive(Debug)]
pub struct ApiError(pub EnergyError);

impl From<EnergyError> for ApiError {
    fn from(err: EnergyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EnergyError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            EnergyError::InsufficientData { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EnergyError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            warn!(error = %self.0, status = %status, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
