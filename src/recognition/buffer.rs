//! Sliding window of recent pose frames.
//!
//! Keeps the last `capacity` frames in temporal order. Pushing into a full
//! window evicts the oldest frame first.

use crate::pose::PoseFrame;
use std::collections::VecDeque;
use std::sync::Arc;

/// Fixed-capacity FIFO of pose frames.
#[derive(Debug, Clone)]
pub struct TemporalBuffer {
    frames: VecDeque<Arc<PoseFrame>>,
    capacity: usize,
}

impl TemporalBuffer {
    /// Creates an empty buffer.
    ///
    /// # Panics
    /// Panics if `capacity` is zero. Configured window sizes are validated
    /// before they reach here.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "temporal buffer capacity must be positive");
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a frame, evicting the oldest when full.
    pub fn push(&mut self, frame: Arc<PoseFrame>) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// The current window, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<PoseFrame>> {
        self.frames.iter().cloned().collect()
    }

    /// The window a `push(frame)` would produce, without pushing.
    pub fn with_frame(&self, frame: &Arc<PoseFrame>) -> Vec<Arc<PoseFrame>> {
        let skip = usize::from(self.frames.len() == self.capacity);
        self.frames
            .iter()
            .skip(skip)
            .chain(std::iter::once(frame))
            .cloned()
            .collect()
    }

    /// True once `capacity` frames have been pushed.
    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every frame; capacity is unchanged.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
