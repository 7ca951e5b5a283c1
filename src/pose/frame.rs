//! Pose frame types.
//!
//! A `PoseFrame` is immutable once built. The engine shares frames through
//! `Arc` so the temporal window never copies keypoint data.

use serde::{Deserialize, Serialize};

/// A single named body or hand keypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Keypoint name from the estimator's schema (e.g. "left_wrist").
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    /// Depth, when the estimator provides 3-D output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Detection confidence in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Keypoint {
    /// Creates a 2-D keypoint.
    pub fn new(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z: None,
            score: None,
        }
    }

    /// Adds a depth coordinate.
    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    /// Adds a detection score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// One pose estimate: the ordered keypoints of a single video frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseFrame {
    keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    /// Number of features each keypoint contributes to model input.
    pub const FEATURES_PER_KEYPOINT: usize = 3;

    /// Creates a frame from keypoints in schema order.
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Returns the keypoints in schema order.
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// Returns the number of keypoints.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Returns true if the frame carries no keypoints.
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Number of model features this frame flattens to.
    pub fn feature_len(&self) -> usize {
        self.keypoints.len() * Self::FEATURES_PER_KEYPOINT
    }

    /// Appends `[x, y, z]` per keypoint to `out`; a missing depth reads as 0.
    pub fn extend_features(&self, out: &mut Vec<f32>) {
        out.reserve(self.feature_len());
        for kp in &self.keypoints {
            out.push(kp.x);
            out.push(kp.y);
            out.push(kp.z.unwrap_or(0.0));
        }
    }

    /// Flattens the frame to a feature vector.
    pub fn features(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.feature_len());
        self.extend_features(&mut out);
        out
    }
}

impl From<Vec<Keypoint>> for PoseFrame {
    fn from(keypoints: Vec<Keypoint>) -> Self {
        Self::new(keypoints)
    }
}
