//! Consumer-facing recognition state.
//!
//! The UI (or any other consumer) subscribes to a `watch` channel and reads
//! `loaded`, `loading`, `lastResult`, and `error` after each change.

use crate::error::SignError;
use crate::model::LifecycleState;
use crate::recognition::result::RecognitionResult;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of what a consumer needs to render recognition status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionState {
    pub loaded: bool,
    pub loading: bool,
    pub last_result: Option<RecognitionResult>,
    pub error: Option<String>,
    /// Sequence number of the last processed update.
    pub sequence: u64,
}

/// Publishes `RecognitionState` changes. Clones share one channel.
#[derive(Debug, Clone)]
pub struct StateHolder {
    tx: Arc<watch::Sender<RecognitionState>>,
}

impl Default for StateHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHolder {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RecognitionState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    pub fn current(&self) -> RecognitionState {
        self.tx.borrow().clone()
    }

    /// Receives every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<RecognitionState> {
        self.tx.subscribe()
    }

    /// Mirror a model lifecycle transition.
    ///
    /// A load failure becomes the error and starting a retry clears it.
    /// Reaching Ready leaves the error alone: an inference failure may land
    /// before the Ready transition is forwarded here.
    pub fn apply_lifecycle(&self, lifecycle: &LifecycleState) {
        self.tx.send_modify(|state| {
            state.loaded = lifecycle.is_ready();
            state.loading = lifecycle.is_loading();
            match lifecycle {
                LifecycleState::Failed(reason) => state.error = Some(reason.clone()),
                LifecycleState::Loading => state.error = None,
                LifecycleState::Ready | LifecycleState::Unloaded => {}
            }
        });
    }

    /// Record a successful update.
    pub fn record_result(&self, result: &RecognitionResult, sequence: u64) {
        self.tx.send_modify(|state| {
            state.last_result = Some(result.clone());
            state.error = None;
            state.sequence = sequence;
        });
    }

    /// Record a failed update; the previous result stays visible.
    pub fn record_error(&self, error: &SignError) {
        let message = error.to_string();
        self.tx.send_modify(|state| state.error = Some(message));
    }

    /// Forget the last result, keeping lifecycle flags.
    pub fn clear_result(&self) {
        self.tx.send_modify(|state| {
            state.last_result = None;
            state.error = None;
        });
    }
}
