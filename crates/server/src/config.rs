//! Server configuration

use anyhow::Result;
use energy_lib::dataset::{DEFAULT_SAMPLE_COUNT, DEFAULT_SEED};
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the prediction API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path of the persisted model artifact
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Synthetic samples generated per training run
    #[serde(default = "default_training_samples")]
    pub training_samples: usize,

    /// Seed for synthetic data generation
    #[serde(default = "default_training_seed")]
    pub training_seed: u64,

    /// Seed for the demo recommendation endpoint
    #[serde(default = "default_recommendation_seed")]
    pub recommendation_seed: u64,
}

fn default_api_port() -> u16 {
    5000
}

fn default_model_path() -> String {
    "energy_model.json".to_string()
}

fn default_training_samples() -> usize {
    DEFAULT_SAMPLE_COUNT
}

fn default_training_seed() -> u64 {
    DEFAULT_SEED
}

fn default_recommendation_seed() -> u64 {
    7
}

impl ServerConfig {
    /// Load configuration from GREENGRID_* environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("GREENGRID"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServerConfig {
            api_port: default_api_port(),
            model_path: default_model_path(),
            training_samples: default_training_samples(),
            training_seed: default_training_seed(),
            recommendation_seed: default_recommendation_seed(),
        }))
    }
}
