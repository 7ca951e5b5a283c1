//! Gloss classification models and their load-once lifecycle.

pub mod assets;
pub mod linear;
pub mod loader;
pub mod source;

pub use assets::{AssetLocation, parse_labels};
pub use linear::{LinearGlossModel, LinearWeights, Pooling};
pub use loader::{LifecycleState, LifecycleWatcher, ModelLoader};
pub use source::{AssetModelSource, LoadOptions, ModelSource};

use crate::error::{Result, SignError};
use crate::pose::PoseFrame;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A loaded sign classifier.
///
/// Implementations are read-only after construction and shared across
/// inference calls, so `infer` takes `&self`.
pub trait GlossModel: Send + Sync {
    /// Classify a window of frames, oldest first.
    ///
    /// Returns one probability per label, in label order.
    fn infer(&self, window: &[Arc<PoseFrame>]) -> Result<Vec<f32>>;

    /// The label vocabulary, in the order `infer` reports probabilities.
    fn labels(&self) -> &[String];

    /// Human-readable model name.
    fn name(&self) -> &str;
}

/// Implement GlossModel for Arc<T> to allow sharing one model across engines.
impl<T: GlossModel> GlossModel for Arc<T> {
    fn infer(&self, window: &[Arc<PoseFrame>]) -> Result<Vec<f32>> {
        (**self).infer(window)
    }

    fn labels(&self) -> &[String] {
        (**self).labels()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock model for testing.
///
/// Returns a fixed distribution and records the first feature of every frame
/// in each window it is asked to classify.
#[derive(Debug, Clone)]
pub struct MockModel {
    name: String,
    labels: Vec<String>,
    distribution: Vec<f32>,
    fail_on: Vec<usize>,
    calls: Arc<AtomicUsize>,
    windows: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl MockModel {
    /// Create a mock with the given labels and a uniform distribution.
    pub fn new(labels: &[&str]) -> Self {
        let uniform = if labels.is_empty() {
            0.0
        } else {
            1.0 / labels.len() as f32
        };
        Self {
            name: "mock-model".to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            distribution: vec![uniform; labels.len()],
            fail_on: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            windows: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure the distribution returned by every call.
    pub fn with_distribution(mut self, distribution: Vec<f32>) -> Self {
        self.distribution = distribution;
        self
    }

    /// Configure the mock to fail on the given call (0-based).
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on.push(call);
        self
    }

    /// Number of `infer` calls so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Windows seen by successful calls, one marker per frame.
    pub fn windows(&self) -> Vec<Vec<f32>> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl GlossModel for MockModel {
    fn infer(&self, window: &[Arc<PoseFrame>]) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&call) {
            return Err(SignError::Inference {
                message: format!("mock inference failure on call {}", call),
            });
        }

        let markers = window
            .iter()
            .map(|frame| frame.keypoints().first().map_or(0.0, |kp| kp.x))
            .collect();
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(markers);

        Ok(self.distribution.clone())
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn name(&self) -> &str {
        &self.name
    }
}
