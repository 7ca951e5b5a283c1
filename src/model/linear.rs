//! Built-in linear softmax classifier.
//!
//! The weights file is JSON exported by the training pipeline:
//!
//! ```json
//! {
//!   "name": "asl-isolated-v1",
//!   "pooling": "flatten",
//!   "input_dim": 3168,
//!   "weights": [[...], ...],
//!   "bias": [...]
//! }
//! ```
//!
//! `weights` has one row per label, each `input_dim` long.

use crate::error::{Result, SignError};
use crate::model::GlossModel;
use crate::pose::PoseFrame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a window of frames becomes one input vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pooling {
    /// Concatenate frame features, oldest first.
    #[default]
    Flatten,
    /// Average each feature over the window.
    Mean,
}

/// Serialized form of the weights file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearWeights {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pooling: Pooling,
    pub input_dim: usize,
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

/// Linear layer followed by softmax.
#[derive(Debug, Clone)]
pub struct LinearGlossModel {
    name: String,
    pooling: Pooling,
    input_dim: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    labels: Vec<String>,
}

impl LinearGlossModel {
    /// Build a model from parsed weights and the label vocabulary.
    ///
    /// # Errors
    /// Returns `SignError::AssetParse` if the weight shapes disagree with
    /// each other or with the number of labels.
    pub fn new(spec: LinearWeights, labels: Vec<String>) -> Result<Self> {
        let shape_error = |message: String| SignError::AssetParse {
            location: "model weights".to_string(),
            message,
        };

        if spec.input_dim == 0 {
            return Err(shape_error("input_dim must be positive".to_string()));
        }
        if spec.weights.len() != labels.len() {
            return Err(shape_error(format!(
                "{} weight rows for {} labels",
                spec.weights.len(),
                labels.len()
            )));
        }
        if spec.bias.len() != labels.len() {
            return Err(shape_error(format!(
                "{} bias terms for {} labels",
                spec.bias.len(),
                labels.len()
            )));
        }
        if let Some((row, weights)) = spec
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.len() != spec.input_dim)
        {
            return Err(shape_error(format!(
                "weight row {} has {} values, expected {}",
                row,
                weights.len(),
                spec.input_dim
            )));
        }

        Ok(Self {
            name: spec.name.unwrap_or_else(|| "linear".to_string()),
            pooling: spec.pooling,
            input_dim: spec.input_dim,
            weights: spec.weights,
            bias: spec.bias,
            labels,
        })
    }

    /// Parse a JSON weights file and build the model.
    pub fn from_json(bytes: &[u8], labels: Vec<String>) -> Result<Self> {
        let spec: LinearWeights =
            serde_json::from_slice(bytes).map_err(|e| SignError::AssetParse {
                location: "model weights".to_string(),
                message: e.to_string(),
            })?;
        Self::new(spec, labels)
    }

    /// Expected length of the pooled input vector.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn pool(&self, window: &[Arc<PoseFrame>]) -> Result<Vec<f32>> {
        match self.pooling {
            Pooling::Flatten => {
                let mut features = Vec::with_capacity(self.input_dim);
                for frame in window {
                    frame.extend_features(&mut features);
                }
                Ok(features)
            }
            Pooling::Mean => {
                let Some(first) = window.first() else {
                    return Ok(Vec::new());
                };
                let width = first.feature_len();
                let mut sums = vec![0.0f32; width];
                for (index, frame) in window.iter().enumerate() {
                    if frame.feature_len() != width {
                        return Err(SignError::Inference {
                            message: format!(
                                "frame {} has {} features, expected {}",
                                index,
                                frame.feature_len(),
                                width
                            ),
                        });
                    }
                    for (sum, value) in sums.iter_mut().zip(frame.features()) {
                        *sum += value;
                    }
                }
                let count = window.len() as f32;
                Ok(sums.into_iter().map(|s| s / count).collect())
            }
        }
    }
}

impl GlossModel for LinearGlossModel {
    fn infer(&self, window: &[Arc<PoseFrame>]) -> Result<Vec<f32>> {
        let input = self.pool(window)?;
        if input.len() != self.input_dim {
            return Err(SignError::Inference {
                message: format!(
                    "expected {} input features, got {}",
                    self.input_dim,
                    input.len()
                ),
            });
        }

        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(&input).map(|(w, x)| w * x).sum::<f32>() + bias)
            .collect();

        softmax(&logits)
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Result<Vec<f32>> {
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(SignError::Inference {
            message: "model produced non-finite logits".to_string(),
        });
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| e / total).collect())
}
