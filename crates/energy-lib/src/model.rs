//! The fitted regression model
//!
//! A [`FittedModel`] is an immutable set of learned coefficients mapping
//! (hour, temperature, is_weekend) to a usage estimate in kWh. Persistence is
//! handled by the store; this type only knows how to evaluate itself.

use serde::{Deserialize, Serialize};

/// Model feature names, in coefficient order.
pub const FEATURE_NAMES: [&str; 3] = ["hour", "temperature", "is_weekend"];

/// Learned coefficients of the affine usage model:
/// `usage = intercept + w0*hour + w1*temperature + w2*is_weekend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub intercept: f64,
    /// Weights for `[hour, temperature, is_weekend]`.
    pub weights: [f64; 3],
}

impl FittedModel {
    /// Raw affine prediction, with no clamping or rounding applied.
    pub fn predict_raw(&self, hour: f64, temperature: f64, is_weekend: f64) -> f64 {
        self.intercept
            + self.weights[0] * hour
            + self.weights[1] * temperature
            + self.weights[2] * is_weekend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_raw_is_affine() {
        let model = FittedModel {
            intercept: 10.0,
            weights: [1.0, 2.0, -5.0],
        };
        assert_eq!(model.predict_raw(0.0, 0.0, 0.0), 10.0);
        assert_eq!(model.predict_raw(3.0, 4.0, 1.0), 10.0 + 3.0 + 8.0 - 5.0);
    }

    #[test]
    fn test_serde_round_trip_is_exact() {
        let model = FittedModel {
            intercept: 49.73629184,
            weights: [0.6341, 2.0017, -19.8852],
        };
        let json = serde_json::to_string(&model).unwrap();
        let back: FittedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, back);
    }
}
