//! Error types for signsh.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Model asset errors
    #[error("Failed to fetch asset {location}: {message}")]
    AssetFetch { location: String, message: String },

    #[error("Failed to parse asset {location}: {message}")]
    AssetParse { location: String, message: String },

    #[error("Model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    // Recognition errors
    #[error("Invalid pose frame: {message}")]
    InvalidFrame { message: String },

    #[error("Inference failed: {message}")]
    Inference { message: String },

    #[error("Recognition engine has shut down")]
    EngineClosed,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignError {
    /// Returns true for errors that belong to a single inference call.
    ///
    /// These leave the engine untouched, so the next update can proceed.
    pub fn is_inference_failure(&self) -> bool {
        matches!(
            self,
            SignError::Inference { .. } | SignError::InvalidFrame { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SignError>;
