//! Request handlers for the API endpoints.

use std::f64::consts::PI;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use energy_lib::predictor::{coerce_float, coerce_integer};
use energy_lib::PredictionInput;
use prometheus::{Encoder, TextEncoder};
use rand::Rng;
use serde_json::json;

use super::types::{
    ApiError, OptimizeResponse, PredictRequest, PredictResponse, Recommendation,
    RecommendationsResponse, StatusResponse, SystemStatusRequest, SystemStatusResponse, UsageRow,
};
use super::AppState;

/// Simulated load contexts for the recommendations endpoint
const LOAD_CONTEXTS: [&str; 3] = ["high", "medium", "low"];

/// Liveness probe - always 200, with the warm-up outcome attached
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "GreenGrid API is running".to_string(),
        model_ready: state.model_ready.load(Ordering::Relaxed),
    })
}

/// Predicts usage from user-supplied features.
///
/// Missing fields default to hour 12, temperature 30.0, weekday. Fields that
/// cannot be coerced return 400 with the offending field named.
pub async fn post_predict(
    State(state): State<Arc<AppState>>,
    body: Option<Json<PredictRequest>>,
) -> Result<Json<PredictResponse>, ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();

    let hour = req.hour.unwrap_or_else(|| json!(12));
    let temperature = req.temperature.unwrap_or_else(|| json!(30.0));
    let is_weekend = req.is_weekend.unwrap_or_else(|| json!(0));

    let input = PredictionInput::from_values(&hour, &temperature, &is_weekend)?;
    let predicted_usage = state.predictor.predict(&input)?;

    Ok(Json(PredictResponse {
        predicted_usage,
        inputs: input,
    }))
}

/// Mock historical usage for the dashboard chart: 24 hourly predictions for
/// a typical weekday, with temperature following a sinusoidal daily curve.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UsageRow>>, ApiError> {
    let mut rows = Vec::with_capacity(24);
    for hour in 0..24i64 {
        // Cooler at night, hottest mid-afternoon
        let temperature = 25.0 + 10.0 * ((hour as f64 - 6.0) * PI / 12.0).sin();
        let usage = state
            .predictor
            .predict(&PredictionInput::new(hour, temperature, 0))?;
        rows.push(UsageRow {
            hour: format!("{hour}:00"),
            usage,
            temperature: round_tenths(temperature),
        });
    }
    Ok(Json(rows))
}

/// Energy-saving tips for a simulated load context.
///
/// The context is drawn from a seeded RNG held in app state, so a fixed seed
/// yields a reproducible sequence.
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
) -> Json<RecommendationsResponse> {
    let context = {
        let mut rng = state
            .recommendation_rng
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        LOAD_CONTEXTS[rng.random_range(0..LOAD_CONTEXTS.len())]
    };

    Json(RecommendationsResponse {
        context: context.to_string(),
        recommendations: tips_for(context),
    })
}

/// Rule-based on/off state for campus systems.
///
/// Streetlights are on from 18:00 to 06:00; AC runs above 25 degrees.
pub async fn post_system_status(
    body: Option<Json<SystemStatusRequest>>,
) -> Result<Json<SystemStatusResponse>, ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();

    let hour = coerce_integer("hour", &req.hour.unwrap_or_else(|| json!(12)))?;
    let temperature = coerce_float("temperature", &req.temperature.unwrap_or_else(|| json!(25.0)))?;

    let lights_on = hour >= 18 || hour < 6;
    let ac_on = temperature > 25.0;

    Ok(Json(SystemStatusResponse {
        streetlights: on_off(lights_on),
        ac_system: on_off(ac_on),
        message: "Systems auto-adjusted based on environment.".to_string(),
    }))
}

/// Simulated load shedding with a fixed action plan
pub async fn post_optimize() -> Json<OptimizeResponse> {
    Json(OptimizeResponse {
        status: "Optimized".to_string(),
        actions: vec![
            "Dimmed Streetlights by 20%".to_string(),
            "Set AC to Eco-Mode (26°C)".to_string(),
            "Shifted Non-Essential Loads".to_string(),
        ],
        savings_estimated: "15%".to_string(),
    })
}

/// Prometheus metrics endpoint
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

fn tips_for(context: &str) -> Vec<Recommendation> {
    let tips: &[(u32, &str, &str)] = match context {
        "high" => &[
            (
                1,
                "High usage detected! Turn off AC in empty classrooms.",
                "Urgent",
            ),
            (2, "Dim hallway lights by 50% to reduce load.", "Lighting"),
        ],
        "medium" => &[
            (
                3,
                "Usage is normal. Check Library thermostat setpoint.",
                "Optimization",
            ),
            (4, "Ensure computer labs are in power-saving mode.", "IT"),
        ],
        _ => &[
            (5, "Great job! Usage is low. Maintenance time?", "Info"),
            (6, "Inspect solar panels for efficiency.", "Maintenance"),
        ],
    };

    tips.iter()
        .map(|(id, text, category)| Recommendation {
            id: *id,
            text: text.to_string(),
            category: category.to_string(),
        })
        .collect()
}

fn on_off(on: bool) -> String {
    if on { "ON" } else { "OFF" }.to_string()
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tips_cover_every_context() {
        let high = tips_for("high");
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].id, 1);
        assert_eq!(high[1].category, "Lighting");

        let medium = tips_for("medium");
        assert_eq!(medium[0].id, 3);

        let low = tips_for("low");
        assert_eq!(low[1].text, "Inspect solar panels for efficiency.");
    }

    #[test]
    fn test_on_off_labels() {
        assert_eq!(on_off(true), "ON");
        assert_eq!(on_off(false), "OFF");
    }

    #[test]
    fn test_round_tenths() {
        assert_eq!(round_tenths(29.6602), 29.7);
        assert_eq!(round_tenths(25.0), 25.0);
    }
}
