//! Debounces the emitted gloss across consecutive inferences.
//!
//! A gloss must win `window` inferences in a row before it replaces the
//! emitted one. An empty gloss (nothing cleared the gate) follows the same
//! rule, so a run of low-confidence windows clears the output.

use crate::recognition::result::RecognitionResult;

#[derive(Debug, Clone, Default)]
pub struct Stabilizer {
    window: usize,
    candidate: String,
    streak: usize,
    stable: String,
}

impl Stabilizer {
    /// `window` of 0 or 1 passes every gloss straight through.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            ..Self::default()
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Replace the result's gloss with the stable one.
    ///
    /// `confidence` and `top` still describe the current inference.
    pub fn apply(&mut self, mut result: RecognitionResult) -> RecognitionResult {
        if result.gloss == self.candidate {
            self.streak += 1;
        } else {
            self.candidate.clone_from(&result.gloss);
            self.streak = 1;
        }

        if self.streak >= self.window {
            self.stable.clone_from(&self.candidate);
        }

        result.gloss.clone_from(&self.stable);
        result
    }

    pub fn reset(&mut self) {
        self.candidate.clear();
        self.stable.clear();
        self.streak = 0;
    }
}
