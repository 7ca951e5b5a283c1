//! Recognition output types.

use crate::defaults;
use serde::{Deserialize, Serialize};

/// One ranked label candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub probability: f32,
}

impl Candidate {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Outcome of one recognition step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Best gloss, or empty when nothing cleared the confidence gate.
    pub gloss: String,
    /// Probability of the top candidate, in [0, 1].
    pub confidence: f32,
    /// Up to K candidates, highest probability first.
    pub top: Vec<Candidate>,
    /// Sequence number of the update that produced this result.
    pub sequence: u64,
}

impl RecognitionResult {
    /// The warm-up result: no gloss, zero confidence, no candidates.
    pub fn empty(sequence: u64) -> Self {
        Self {
            gloss: defaults::NO_GLOSS.to_string(),
            confidence: 0.0,
            top: Vec::new(),
            sequence,
        }
    }

    /// True when a gloss was asserted.
    pub fn has_gloss(&self) -> bool {
        !self.gloss.is_empty()
    }

    /// True if this result predates `latest_sequence`.
    ///
    /// `sequence` names the update that produced the result. An update
    /// skipped by the stride replies with the previous result unchanged, so
    /// that reply compares as stale against the skipped update's own number.
    pub fn is_stale(&self, latest_sequence: u64) -> bool {
        self.sequence < latest_sequence
    }
}
