//! Streaming sign recognition.
//!
//! ```text
//! ┌───────────┐    ┌──────────┐    ┌───────────┐    ┌────────────┐    ┌────────────┐
//! │ PoseFrame │───▶│ Temporal │───▶│   Model   │───▶│ Aggregator │───▶│ Stabilizer │───▶ StateHolder
//! │  update   │    │  Buffer  │    │ (blocking)│    │  top-K +   │    │            │
//! └───────────┘    └──────────┘    └───────────┘    │   gate     │    └────────────┘
//!                        │               ▲          └────────────┘
//!                        ▼               │
//!                  cadence: full    ModelLoader
//!                  window, stride   (load once)
//! ```
//!
//! `Recognizer` is the single-owner state machine. `RecognitionEngine` is the
//! shared handle that serializes updates through one worker task.

pub mod aggregator;
pub mod buffer;
pub mod engine;
pub mod recognizer;
pub mod result;
pub mod stabilizer;
pub mod state;

pub use aggregator::ResultAggregator;
pub use buffer::TemporalBuffer;
pub use engine::RecognitionEngine;
pub use recognizer::Recognizer;
pub use result::{Candidate, RecognitionResult};
pub use stabilizer::Stabilizer;
pub use state::{RecognitionState, StateHolder};
