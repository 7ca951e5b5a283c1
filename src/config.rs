use crate::defaults;
use crate::error::{Result, SignError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub recognition: RecognitionConfig,
}

/// Model asset locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Path or http(s) URL of the weights file
    pub model_path: String,
    /// Path or http(s) URL of the label vocabulary
    pub labels_path: String,
}

/// Recognition engine tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    pub window_size: usize,
    pub top_k: usize,
    pub min_confidence: f32,
    pub stride: usize,
    pub stability_window: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: defaults::MODEL_PATH.to_string(),
            labels_path: defaults::LABELS_PATH.to_string(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            window_size: defaults::WINDOW_SIZE,
            top_k: defaults::TOP_K,
            min_confidence: defaults::MIN_CONFIDENCE,
            stride: defaults::STRIDE,
            stability_window: defaults::STABILITY_WINDOW,
        }
    }
}

impl RecognitionConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("recognition.window_size", self.window_size),
            ("recognition.top_k", self.top_k),
            ("recognition.stride", self.stride),
            ("recognition.stability_window", self.stability_window),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(SignError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "must be a positive integer".to_string(),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(SignError::ConfigInvalidValue {
                key: "recognition.min_confidence".to_string(),
                message: format!("must be within [0, 1], got {}", self.min_confidence),
            });
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML and unreadable files are still errors.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SIGNSH_MODEL_PATH → model.model_path
    /// - SIGNSH_LABELS_PATH → model.labels_path
    /// - SIGNSH_MIN_CONFIDENCE → recognition.min_confidence (ignored if unparsable)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("SIGNSH_MODEL_PATH")
            && !path.is_empty()
        {
            self.model.model_path = path;
        }

        if let Ok(path) = std::env::var("SIGNSH_LABELS_PATH")
            && !path.is_empty()
        {
            self.model.labels_path = path;
        }

        if let Ok(raw) = std::env::var("SIGNSH_MIN_CONFIDENCE")
            && !raw.is_empty()
        {
            match raw.parse::<f32>() {
                Ok(value) => self.recognition.min_confidence = value,
                Err(e) => tracing::warn!(value = %raw, "ignoring SIGNSH_MIN_CONFIDENCE: {e}"),
            }
        }

        self
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        if self.model.model_path.is_empty() {
            return Err(SignError::ConfigInvalidValue {
                key: "model.model_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.model.labels_path.is_empty() {
            return Err(SignError::ConfigInvalidValue {
                key: "model.labels_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        self.recognition.validate()
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/signsh/config.toml on Linux, or a path relative to
    /// the working directory when no config directory is known.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("signsh")
            .join("config.toml")
    }
}
