//! Synthetic training data generation
//!
//! Produces labeled (hour, temperature, is_weekend) -> energy_usage samples
//! from a fixed generative formula plus gaussian noise. Generation is a pure
//! function of (sample_count, seed), so repeated runs yield identical
//! datasets.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Default number of samples per training run
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// Default RNG seed, kept fixed so benchmarks stay reproducible
pub const DEFAULT_SEED: u64 = 42;

/// Standard deviation of the noise added to each usage label
const NOISE_STD_DEV: f64 = 5.0;

/// One labeled observation of building energy usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Hour of day, 0-23
    pub hour: u8,
    /// Ambient temperature in degrees Celsius
    pub temperature: f64,
    pub is_weekend: bool,
    /// Energy usage label in kWh, never negative
    pub energy_usage: f64,
}

/// An ordered collection of training samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<TrainingSample>,
}

impl Dataset {
    pub fn from_samples(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Noiseless expected usage for a feature combination.
///
/// Usage peaks mid-afternoon (the sine term crests at hour 15), rises with
/// temperature (AC load), and drops by a flat 20 kWh on weekends.
pub fn expected_usage(hour: f64, temperature: f64, is_weekend: f64) -> f64 {
    50.0 + 10.0 * ((hour - 9.0) * std::f64::consts::PI / 12.0).sin() + 2.0 * temperature
        - 20.0 * is_weekend
}

/// Generates `sample_count` samples from a deterministic seed.
///
/// Hours are drawn uniformly from {0..23}, temperatures uniformly from
/// [20, 40), weekend flags uniformly from {0, 1}. Labels follow
/// [`expected_usage`] plus N(0, 5) noise, floored at zero.
pub fn generate(sample_count: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(sample_count);

    for _ in 0..sample_count {
        let hour: u8 = rng.random_range(0..24);
        let temperature: f64 = rng.random_range(20.0..40.0);
        let is_weekend = rng.random_range(0..2) == 1;

        let weekend_flag = if is_weekend { 1.0 } else { 0.0 };
        let usage = expected_usage(f64::from(hour), temperature, weekend_flag)
            + gaussian_noise(&mut rng, NOISE_STD_DEV);

        samples.push(TrainingSample {
            hour,
            temperature,
            is_weekend,
            // Usage cannot be negative
            energy_usage: usage.max(0.0),
        });
    }

    Dataset { samples }
}

/// Generates a dataset with the default sample count and seed.
pub fn generate_default() -> Dataset {
    generate(DEFAULT_SAMPLE_COUNT, DEFAULT_SEED)
}

/// Zero-mean gaussian noise via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-10, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
