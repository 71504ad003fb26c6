//! Prediction with input coercion
//!
//! The predictor validates loosely-typed inputs, fetches the current model
//! through the store on every call (lazy, no caching of its own), and applies
//! the output contract: clamp at zero, round to two decimal places.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{EnergyError, Result};
use crate::observability::EnergyMetrics;
use crate::store::ModelStore;

/// Validated features for a single prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionInput {
    pub hour: i64,
    pub temperature: f64,
    /// Normalized to 0 or 1; any non-zero input counts as a weekend
    pub is_weekend: i64,
}

impl PredictionInput {
    pub fn new(hour: i64, temperature: f64, is_weekend: i64) -> Self {
        Self {
            hour,
            temperature,
            is_weekend: i64::from(is_weekend != 0),
        }
    }

    /// Coerces loosely-typed JSON values into a prediction input.
    ///
    /// Numbers, numeric strings, and booleans are accepted; floats truncate
    /// when an integer is expected. Anything else is rejected with the
    /// offending field named.
    pub fn from_values(hour: &Value, temperature: &Value, is_weekend: &Value) -> Result<Self> {
        Ok(Self::new(
            coerce_integer("hour", hour)?,
            coerce_float("temperature", temperature)?,
            coerce_integer("is_weekend", is_weekend)?,
        ))
    }
}

/// Serves predictions against the store-managed model.
pub struct EnergyPredictor {
    store: Arc<ModelStore>,
    metrics: EnergyMetrics,
}

impl EnergyPredictor {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self {
            store,
            metrics: EnergyMetrics::new(),
        }
    }

    /// Predicted energy usage in kWh, clamped at zero and rounded to two
    /// decimal places.
    ///
    /// Every call goes through [`ModelStore::load_or_train`], so the first
    /// prediction of a process may pay a full training pass.
    pub fn predict(&self, input: &PredictionInput) -> Result<f64> {
        let started = Instant::now();
        let result = self.predict_inner(input);
        self.metrics.sync_store_stats(&self.store.stats());

        match &result {
            Ok(usage) => {
                self.metrics
                    .observe_prediction_latency(started.elapsed().as_secs_f64());
                self.metrics.inc_predictions_served();
                debug!(
                    hour = input.hour,
                    temperature = input.temperature,
                    is_weekend = input.is_weekend,
                    usage = usage,
                    "prediction served"
                );
            }
            Err(err) => {
                self.metrics.inc_prediction_errors();
                debug!(error = %err, "prediction failed");
            }
        }

        result
    }

    fn predict_inner(&self, input: &PredictionInput) -> Result<f64> {
        let model = self.store.load_or_train()?;
        let raw = model.predict_raw(
            input.hour as f64,
            input.temperature,
            input.is_weekend as f64,
        );
        Ok(round_hundredths(raw.max(0.0)))
    }
}

/// Coerces a JSON value to an integer: numbers truncate toward zero, numeric
/// strings parse, booleans map to 0/1.
pub fn coerce_integer(field: &'static str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                Ok(f.trunc() as i64)
            } else {
                Err(EnergyError::invalid_input(
                    field,
                    format!("number {n} is out of range"),
                ))
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| EnergyError::invalid_input(field, format!("'{s}' is not an integer"))),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(EnergyError::invalid_input(
            field,
            format!("unsupported value: {other}"),
        )),
    }
}

/// Coerces a JSON value to a float: numbers pass through, numeric strings
/// parse, booleans map to 0.0/1.0.
pub fn coerce_float(field: &'static str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            EnergyError::invalid_input(field, format!("number {n} is out of range"))
        }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| EnergyError::invalid_input(field, format!("'{s}' is not a number"))),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(EnergyError::invalid_input(
            field,
            format!("unsupported value: {other}"),
        )),
    }
}

/// Rounds to two decimal places, half away from zero.
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::expected_usage;
    use crate::store::{MemoryStorage, TrainingConfig};
    use serde_json::json;

    fn test_predictor() -> EnergyPredictor {
        let store = ModelStore::new(MemoryStorage::new(), TrainingConfig::default());
        EnergyPredictor::new(Arc::new(store))
    }

    #[test]
    fn test_end_to_end_prediction_tracks_formula() {
        let predictor = test_predictor();
        let usage = predictor
            .predict(&PredictionInput::new(12, 30.0, 0))
            .unwrap();

        // 50 + 10*sin(3*pi/12) + 60 = 117.07 give or take regression error
        let expected = expected_usage(12.0, 30.0, 0.0);
        assert!(
            (usage - expected).abs() < 15.0,
            "usage {usage} too far from {expected}"
        );
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let predictor = test_predictor();
        let input = PredictionInput::new(8, 27.3, 1);
        assert_eq!(
            predictor.predict(&input).unwrap(),
            predictor.predict(&input).unwrap()
        );
    }

    #[test]
    fn test_prediction_never_negative() {
        let predictor = test_predictor();
        // Absurdly cold input drives the raw affine value far below zero
        let usage = predictor
            .predict(&PredictionInput::new(3, -500.0, 1))
            .unwrap();
        assert_eq!(usage, 0.0);
    }

    #[test]
    fn test_prediction_rounds_to_two_places() {
        let predictor = test_predictor();
        let usage = predictor.predict(&PredictionInput::new(9, 30.0, 0)).unwrap();
        let scaled = usage * 100.0;
        assert!(
            (scaled - scaled.round()).abs() < 1e-9,
            "{usage} has more than two decimal places"
        );
    }

    #[test]
    fn test_weekend_flag_normalizes_to_binary() {
        let input = PredictionInput::new(12, 30.0, 5);
        assert_eq!(input.is_weekend, 1);
        let input = PredictionInput::new(12, 30.0, 0);
        assert_eq!(input.is_weekend, 0);
    }

    #[test]
    fn test_from_values_accepts_numbers_strings_and_bools() {
        let input =
            PredictionInput::from_values(&json!("14"), &json!("31.5"), &json!(true)).unwrap();
        assert_eq!(input, PredictionInput::new(14, 31.5, 1));

        let input = PredictionInput::from_values(&json!(12.9), &json!(30), &json!(0)).unwrap();
        assert_eq!(input.hour, 12); // floats truncate
        assert_eq!(input.temperature, 30.0);
    }

    #[test]
    fn test_from_values_rejects_non_numeric_hour() {
        let err =
            PredictionInput::from_values(&json!("abc"), &json!(30.0), &json!(0)).unwrap_err();
        match err {
            EnergyError::InvalidInput { field, .. } => assert_eq!(field, "hour"),
            other => panic!("expected InvalidInput, got {other}"),
        }
    }

    #[test]
    fn test_from_values_rejects_null_temperature() {
        let err = PredictionInput::from_values(&json!(12), &json!(null), &json!(0)).unwrap_err();
        assert!(matches!(err, EnergyError::InvalidInput { field: "temperature", .. }));
    }

    #[test]
    fn test_coerce_integer_table() {
        assert_eq!(coerce_integer("h", &json!(7)).unwrap(), 7);
        assert_eq!(coerce_integer("h", &json!(-3)).unwrap(), -3);
        assert_eq!(coerce_integer("h", &json!(7.8)).unwrap(), 7);
        assert_eq!(coerce_integer("h", &json!(" 15 ")).unwrap(), 15);
        assert_eq!(coerce_integer("h", &json!(false)).unwrap(), 0);
        assert!(coerce_integer("h", &json!("12.5")).is_err());
        assert!(coerce_integer("h", &json!([1])).is_err());
    }

    #[test]
    fn test_coerce_float_table() {
        assert_eq!(coerce_float("t", &json!(25)).unwrap(), 25.0);
        assert_eq!(coerce_float("t", &json!("25.75")).unwrap(), 25.75);
        assert_eq!(coerce_float("t", &json!("1e2")).unwrap(), 100.0);
        assert_eq!(coerce_float("t", &json!(true)).unwrap(), 1.0);
        assert!(coerce_float("t", &json!("warm")).is_err());
        assert!(coerce_float("t", &json!({})).is_err());
    }

    #[test]
    fn test_round_hundredths() {
        assert_eq!(round_hundredths(117.0711), 117.07);
        assert_eq!(round_hundredths(99.999), 100.0);
        assert_eq!(round_hundredths(0.0), 0.0);
    }
}
