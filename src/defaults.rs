//! Default configuration constants for signsh.
//!
//! Shared between the config file layer, the engine, and the CLI so the
//! defaults are stated once.

/// Number of pose frames in the recognition window.
///
/// 32 frames cover roughly one to two seconds of signing at typical
/// camera frame rates, enough for a single isolated sign.
pub const WINDOW_SIZE: usize = 32;

/// Number of ranked candidates reported with each result.
pub const TOP_K: usize = 3;

/// Minimum top probability for a gloss to be asserted.
///
/// 0.0 disables the gate.
pub const MIN_CONFIDENCE: f32 = 0.0;

/// Run inference every `STRIDE` updates once the window is full.
pub const STRIDE: usize = 1;

/// Consecutive agreeing inferences required before a gloss is emitted.
///
/// 1 means every gated gloss is emitted immediately.
pub const STABILITY_WINDOW: usize = 1;

/// Default location of the model weights.
pub const MODEL_PATH: &str = "models/sign_classifier.json";

/// Default location of the label vocabulary.
pub const LABELS_PATH: &str = "models/labels.txt";

/// Capacity of the engine's request queue.
pub const QUEUE_CAPACITY: usize = 64;

/// Gloss used when no prediction clears the confidence gate.
pub const NO_GLOSS: &str = "";
