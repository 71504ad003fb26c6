//! Energy model lifecycle library for GreenGrid
//!
//! This crate provides the core functionality for:
//! - Synthetic training data generation
//! - Ordinary-least-squares model fitting
//! - Model artifact persistence with a train-once cache policy
//! - Prediction with input coercion and output clamping
//! - Prometheus observability

pub mod dataset;
pub mod error;
pub mod model;
pub mod observability;
pub mod predictor;
pub mod store;
pub mod trainer;

pub use error::{EnergyError, Result};
pub use model::FittedModel;
pub use observability::EnergyMetrics;
pub use predictor::{EnergyPredictor, PredictionInput};
pub use store::{FsStorage, MemoryStorage, ModelStorage, ModelStore, StoreStats, TrainingConfig};
