//! Shared recognition engine handle.
//!
//! A single worker task owns the `Recognizer`. Every clone of
//! `RecognitionEngine` sends requests into one FIFO queue, so updates are
//! processed in the order they were issued and at most one inference runs
//! at a time.
//!
//! The worker, not the caller, publishes results to the `StateHolder`.
//! Dropping an `update` future after it was queued therefore never loses
//! the result: consumers watching the state still see it.

use crate::config::RecognitionConfig;
use crate::defaults;
use crate::error::{Result, SignError};
use crate::model::{GlossModel, LifecycleState, LoadOptions, ModelLoader};
use crate::pose::PoseFrame;
use crate::recognition::recognizer::Recognizer;
use crate::recognition::result::RecognitionResult;
use crate::recognition::state::{RecognitionState, StateHolder};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

enum Request {
    Update {
        frame: Arc<PoseFrame>,
        reply: oneshot::Sender<Result<RecognitionResult>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running recognition pipeline.
///
/// The worker stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct RecognitionEngine {
    tx: mpsc::Sender<Request>,
    loader: ModelLoader,
    state: StateHolder,
}

impl RecognitionEngine {
    /// Starts the worker and the lifecycle forwarder on the current runtime.
    ///
    /// # Errors
    /// Returns `SignError::ConfigInvalidValue` if `config` does not validate.
    pub fn spawn(loader: ModelLoader, config: &RecognitionConfig) -> Result<Self> {
        let recognizer = Recognizer::new(loader.clone(), config)?;
        let state = StateHolder::new();
        let (tx, rx) = mpsc::channel(defaults::QUEUE_CAPACITY);

        tokio::spawn(run_worker(recognizer, rx, state.clone()));
        tokio::spawn(forward_lifecycle(loader.clone(), state.clone()));

        tracing::debug!(
            window = config.window_size,
            stride = config.stride,
            top_k = config.top_k,
            "recognition engine started"
        );

        Ok(Self { tx, loader, state })
    }

    /// Queue `frame` and wait for its result.
    ///
    /// # Errors
    /// Everything `Recognizer::update` returns, plus `EngineClosed` if the
    /// worker is gone.
    pub async fn update(&self, frame: impl Into<Arc<PoseFrame>>) -> Result<RecognitionResult> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Update {
                frame: frame.into(),
                reply,
            })
            .await
            .map_err(|_| SignError::EngineClosed)?;
        rx.await.map_err(|_| SignError::EngineClosed)?
    }

    /// Load the model, or retry a failed load.
    pub async fn load(&self, options: LoadOptions) -> Result<Arc<dyn GlossModel>> {
        self.loader.load(options).await
    }

    /// Drop buffered frames and the last result.
    ///
    /// Queued behind any pending updates.
    pub async fn reset(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Reset { reply })
            .await
            .map_err(|_| SignError::EngineClosed)?;
        rx.await.map_err(|_| SignError::EngineClosed)
    }

    /// Current consumer-facing state.
    pub fn state(&self) -> RecognitionState {
        self.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecognitionState> {
        self.state.subscribe()
    }

    /// Sequence number of the newest processed update.
    ///
    /// A result whose `sequence` is lower is stale. This includes the reply
    /// to a stride-skipped update, which repeats the last inferred result.
    pub fn latest_sequence(&self) -> u64 {
        self.state.current().sequence
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.loader.lifecycle()
    }
}

async fn run_worker(
    mut recognizer: Recognizer,
    mut rx: mpsc::Receiver<Request>,
    state: StateHolder,
) {
    while let Some(request) = rx.recv().await {
        match request {
            Request::Update { frame, reply } => {
                let result = recognizer.update(frame).await;
                match &result {
                    Ok(recognized) => state.record_result(recognized, recognizer.sequence()),
                    Err(e) => state.record_error(e),
                }
                if reply.send(result).is_err() {
                    tracing::trace!("update caller went away before its result");
                }
            }
            Request::Reset { reply } => {
                recognizer.reset();
                state.clear_result();
                if reply.send(()).is_err() {
                    tracing::trace!("reset caller went away");
                }
            }
        }
    }
    tracing::debug!("recognition engine stopped");
}

async fn forward_lifecycle(loader: ModelLoader, state: StateHolder) {
    let mut watcher = loader.subscribe();
    // The watcher must not keep the loader's channel alive
    drop(loader);

    state.apply_lifecycle(&watcher.current());
    while let Some(lifecycle) = watcher.changed().await {
        state.apply_lifecycle(&lifecycle);
    }
}
