//! Error types for the energy model lifecycle
//!
//! Each variant maps onto one failure class the API boundary knows how to
//! answer: bad request input, degenerate training data, or unusable storage.

use std::io;
use thiserror::Error;

/// Errors produced by the energy model lifecycle.
#[derive(Error, Debug)]
pub enum EnergyError {
    /// A prediction input could not be coerced into the expected type.
    #[error("invalid input for '{field}': {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    /// The training dataset cannot support an ordinary-least-squares fit.
    #[error("insufficient training data: {reason}")]
    InsufficientData { reason: String },

    /// The model artifact could not be read, written, or verified.
    #[error("model storage unavailable at {location}: {reason}")]
    StorageUnavailable {
        location: String,
        reason: String,
        #[source]
        source: Option<io::Error>,
    },
}

impl EnergyError {
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    pub fn storage(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            location: location.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn storage_io(
        location: impl Into<String>,
        reason: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self::StorageUnavailable {
            location: location.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnergyError>;
