//! Ordinary-least-squares model fitting
//!
//! Fits the affine usage model over three features via the normal equations.
//! The design matrix is only 4 columns wide, so the 4x4 system is solved
//! directly with Gaussian elimination rather than pulling in a linear-algebra
//! dependency.

use std::time::Instant;

use tracing::{debug, info};

use crate::dataset::{Dataset, TrainingSample};
use crate::error::{EnergyError, Result};
use crate::model::{FittedModel, FEATURE_NAMES};

/// Minimum number of samples required to fit four coefficients
pub const MIN_TRAINING_SAMPLES: usize = 4;

/// Intercept plus three feature weights
const DIM: usize = 4;

/// Pivot magnitudes below this make the normal matrix effectively singular
const SINGULARITY_EPS: f64 = 1e-9;

/// Fits an ordinary-least-squares model to `dataset`.
///
/// Fails with [`EnergyError::InsufficientData`] when the dataset has fewer
/// than [`MIN_TRAINING_SAMPLES`] samples, when any feature column is
/// constant, or when the normal matrix turns out singular anyway.
pub fn train(dataset: &Dataset) -> Result<FittedModel> {
    let samples = dataset.samples();
    if samples.len() < MIN_TRAINING_SAMPLES {
        return Err(EnergyError::insufficient_data(format!(
            "{} samples, need at least {MIN_TRAINING_SAMPLES}",
            samples.len()
        )));
    }

    // A constant feature column makes the normal matrix singular; reject it
    // with a message naming the column instead of a generic solve failure.
    for (idx, name) in FEATURE_NAMES.iter().enumerate() {
        let first = feature_value(&samples[0], idx);
        if samples.iter().all(|s| feature_value(s, idx) == first) {
            return Err(EnergyError::insufficient_data(format!(
                "feature '{name}' is constant across all samples"
            )));
        }
    }

    let started = Instant::now();

    // Accumulate X^T X and X^T y for design rows [1, hour, temperature, is_weekend].
    let mut xtx = [[0.0f64; DIM]; DIM];
    let mut xty = [0.0f64; DIM];
    for sample in samples {
        let row = design_row(sample);
        for i in 0..DIM {
            xty[i] += row[i] * sample.energy_usage;
            for j in 0..DIM {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    let beta = solve_linear_system(xtx, xty)?;
    let model = FittedModel {
        intercept: beta[0],
        weights: [beta[1], beta[2], beta[3]],
    };

    debug!(
        intercept = model.intercept,
        w_hour = model.weights[0],
        w_temperature = model.weights[1],
        w_is_weekend = model.weights[2],
        "solved normal equations"
    );
    info!(
        samples = samples.len(),
        r_squared = r_squared(&model, dataset),
        elapsed_us = started.elapsed().as_micros() as u64,
        "model trained"
    );

    Ok(model)
}

/// Coefficient of determination of `model` over `dataset`.
pub fn r_squared(model: &FittedModel, dataset: &Dataset) -> f64 {
    let samples = dataset.samples();
    if samples.is_empty() {
        return 0.0;
    }

    let mean: f64 = samples.iter().map(|s| s.energy_usage).sum::<f64>() / samples.len() as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for sample in samples {
        let row = design_row(sample);
        let predicted = model.predict_raw(row[1], row[2], row[3]);
        ss_res += (sample.energy_usage - predicted).powi(2);
        ss_tot += (sample.energy_usage - mean).powi(2);
    }

    if ss_tot <= f64::EPSILON {
        // Constant labels are fit exactly by the intercept
        return 1.0;
    }
    1.0 - ss_res / ss_tot
}

fn design_row(sample: &TrainingSample) -> [f64; DIM] {
    [
        1.0,
        f64::from(sample.hour),
        sample.temperature,
        if sample.is_weekend { 1.0 } else { 0.0 },
    ]
}

fn feature_value(sample: &TrainingSample, idx: usize) -> f64 {
    design_row(sample)[idx + 1]
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
fn solve_linear_system(mut a: [[f64; DIM]; DIM], mut b: [f64; DIM]) -> Result<[f64; DIM]> {
    for col in 0..DIM {
        let mut pivot = col;
        for row in (col + 1)..DIM {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < SINGULARITY_EPS {
            return Err(EnergyError::insufficient_data(
                "normal matrix is singular; feature columns are linearly dependent",
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..DIM {
            let factor = a[row][col] / a[col][col];
            for k in col..DIM {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; DIM];
    for col in (0..DIM).rev() {
        let mut acc = b[col];
        for k in (col + 1)..DIM {
            acc -= a[col][k] * x[k];
        }
        x[col] = acc / a[col][col];
    }
    Ok(x)
}
