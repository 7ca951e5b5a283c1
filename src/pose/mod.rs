//! Pose frames: the input boundary of the recognition pipeline.
//!
//! Frames are produced by an external pose estimator, one per video frame,
//! and arrive here either directly through the API or as JSON Lines.

pub mod frame;
pub mod reader;

pub use frame::{Keypoint, PoseFrame};
pub use reader::FrameReader;
