//! The recognition state machine.
//!
//! Owns the temporal window and drives one pipeline step per pose frame:
//! ensure the model is ready, extend the window, decide whether inference
//! is due, infer, aggregate, stabilize.
//!
//! Every mutation is committed only after the step succeeds, so a failed
//! step leaves no trace: the next frame sees the same window, cadence, and
//! sequence it would have seen had the failed call never happened.

use crate::config::RecognitionConfig;
use crate::error::{Result, SignError};
use crate::model::{GlossModel, ModelLoader};
use crate::pose::PoseFrame;
use crate::recognition::aggregator::ResultAggregator;
use crate::recognition::buffer::TemporalBuffer;
use crate::recognition::result::RecognitionResult;
use crate::recognition::stabilizer::Stabilizer;
use std::sync::Arc;

/// Single-owner recognition pipeline.
///
/// `update` takes `&mut self`, so one recognizer never runs two inferences
/// at once. Share it through `RecognitionEngine`.
pub struct Recognizer {
    loader: ModelLoader,
    buffer: TemporalBuffer,
    aggregator: ResultAggregator,
    stabilizer: Stabilizer,
    stride: usize,
    /// Committed updates since the last inference.
    pending: usize,
    sequence: u64,
    latest: Option<RecognitionResult>,
}

impl Recognizer {
    /// Creates a recognizer over `loader`.
    ///
    /// # Errors
    /// Returns `SignError::ConfigInvalidValue` for a zero window, K, stride,
    /// or stability window, or a gate outside [0, 1].
    pub fn new(loader: ModelLoader, config: &RecognitionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            loader,
            buffer: TemporalBuffer::new(config.window_size),
            aggregator: ResultAggregator::from_config(config),
            stabilizer: Stabilizer::new(config.stability_window),
            stride: config.stride,
            pending: 0,
            sequence: 0,
            latest: None,
        })
    }

    /// Runs one pipeline step for `frame`.
    ///
    /// While the window is filling this returns the empty result without
    /// running the model. Once full, the model runs on the update that
    /// fills the window and then every `stride` updates; skipped updates
    /// return the previous result unchanged.
    ///
    /// # Errors
    /// - `InvalidFrame` for a frame without keypoints
    /// - `ModelUnavailable` if the model failed to load
    /// - `Inference` if the model or aggregation rejects the window
    pub async fn update(&mut self, frame: impl Into<Arc<PoseFrame>>) -> Result<RecognitionResult> {
        let frame = frame.into();
        if frame.is_empty() {
            return Err(SignError::InvalidFrame {
                message: "frame has no keypoints".to_string(),
            });
        }

        let model = self.loader.ensure_ready().await?;
        let sequence = self.sequence + 1;
        let window = self.buffer.with_frame(&frame);

        if window.len() < self.buffer.capacity() {
            self.commit(frame, sequence);
            tracing::trace!(
                frames = self.buffer.len(),
                window = self.buffer.capacity(),
                "warming up"
            );
            return Ok(RecognitionResult::empty(sequence));
        }

        if !self.inference_due() {
            self.commit(frame, sequence);
            self.pending += 1;
            return Ok(self
                .latest
                .clone()
                .unwrap_or_else(|| RecognitionResult::empty(sequence)));
        }

        let distribution = infer(model.clone(), window).await.inspect_err(|e| {
            tracing::warn!(sequence, "inference failed: {e}");
        })?;
        let result = self
            .aggregator
            .aggregate(model.labels(), &distribution, sequence)?;
        let result = self.stabilizer.apply(result);

        self.commit(frame, sequence);
        self.pending = 0;
        self.latest = Some(result.clone());
        tracing::debug!(
            sequence,
            gloss = %result.gloss,
            confidence = result.confidence,
            "recognized"
        );
        Ok(result)
    }

    fn inference_due(&self) -> bool {
        self.latest.is_none() || self.pending + 1 >= self.stride
    }

    fn commit(&mut self, frame: Arc<PoseFrame>, sequence: u64) {
        self.buffer.push(frame);
        self.sequence = sequence;
    }

    /// Drops buffered history and smoothing state.
    ///
    /// The sequence keeps counting so results stay ordered across resets.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.stabilizer.reset();
        self.pending = 0;
        self.latest = None;
    }

    /// The last inference result, if any.
    pub fn latest(&self) -> Option<&RecognitionResult> {
        self.latest.as_ref()
    }

    /// Sequence number of the last successful update.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Frames currently in the window.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn loader(&self) -> &ModelLoader {
        &self.loader
    }
}

/// Runs the model on tokio's blocking pool; inference is compute-bound.
async fn infer(model: Arc<dyn GlossModel>, window: Vec<Arc<PoseFrame>>) -> Result<Vec<f32>> {
    tokio::task::spawn_blocking(move || model.infer(&window))
        .await
        .map_err(|e| SignError::Inference {
            message: format!("inference task panicked: {}", e),
        })?
}
