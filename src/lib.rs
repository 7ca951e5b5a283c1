//! signsh - Streaming sign language recognition
//!
//! Feeds pose frames through a sliding window into a gloss classifier and
//! publishes ranked, confidence-gated results.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod model;
pub mod pose;
pub mod recognition;

// Core traits (source → model → engine)
pub use model::{GlossModel, ModelSource};

// Model lifecycle
pub use model::{AssetModelSource, LifecycleState, LoadOptions, ModelLoader};

// Recognition
pub use pose::{FrameReader, Keypoint, PoseFrame};
pub use recognition::{RecognitionEngine, RecognitionResult, RecognitionState, Recognizer};

// Error handling
pub use error::{Result, SignError};

// Config
pub use config::{Config, ModelConfig, RecognitionConfig};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        // Plain CARGO_PKG_VERSION when built outside a git checkout
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(
                hash_part.len(),
                7,
                "Git hash should be 7 chars, got: {}",
                hash_part
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
