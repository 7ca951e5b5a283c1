//! Load-once model lifecycle with single-flight loading.
//!
//! ```text
//!  Unloaded ──load──▶ Loading ──ok──▶ Ready
//!                       ▲  │
//!              load()   │  └──err──▶ Failed(reason)
//!              (retry)  └────────────────┘
//! ```
//!
//! The current slot lives in a `tokio::sync::watch` channel. The
//! Unloaded→Loading transition happens inside `send_if_modified`, so exactly
//! one caller starts the fetch; everyone else waits on the same channel.

use crate::error::{Result, SignError};
use crate::model::GlossModel;
use crate::model::source::{LoadOptions, ModelSource};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Public view of the loader's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LifecycleState {
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

impl LifecycleState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LifecycleState::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LifecycleState::Loading)
    }

    /// Ready or Failed.
    pub fn is_settled(&self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            LifecycleState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Unloaded => write!(f, "unloaded"),
            LifecycleState::Loading => write!(f, "loading"),
            LifecycleState::Ready => write!(f, "ready"),
            LifecycleState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

enum Slot {
    Unloaded,
    Loading,
    Ready(Arc<dyn GlossModel>),
    Failed(String),
}

impl Slot {
    fn lifecycle(&self) -> LifecycleState {
        match self {
            Slot::Unloaded => LifecycleState::Unloaded,
            Slot::Loading => LifecycleState::Loading,
            Slot::Ready(_) => LifecycleState::Ready,
            Slot::Failed(reason) => LifecycleState::Failed(reason.clone()),
        }
    }

    fn settled(&self) -> Option<Result<Arc<dyn GlossModel>>> {
        match self {
            Slot::Ready(model) => Some(Ok(model.clone())),
            Slot::Failed(reason) => Some(Err(SignError::ModelUnavailable {
                reason: reason.clone(),
            })),
            Slot::Unloaded | Slot::Loading => None,
        }
    }
}

/// Loads a model exactly once and hands out shared references to it.
///
/// Cloning the loader shares the same slot.
#[derive(Clone)]
pub struct ModelLoader {
    source: Arc<dyn ModelSource>,
    slot: Arc<watch::Sender<Slot>>,
}

impl fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLoader")
            .field("lifecycle", &self.lifecycle())
            .field("source", &"<ModelSource>")
            .finish()
    }
}

impl ModelLoader {
    /// Creates an unloaded loader backed by `source`.
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        let (slot, _) = watch::channel(Slot::Unloaded);
        Self {
            source,
            slot: Arc::new(slot),
        }
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> LifecycleState {
        self.slot.borrow().lifecycle()
    }

    /// The loaded model, if Ready.
    pub fn model(&self) -> Option<Arc<dyn GlossModel>> {
        match &*self.slot.borrow() {
            Slot::Ready(model) => Some(model.clone()),
            _ => None,
        }
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> LifecycleWatcher {
        LifecycleWatcher {
            rx: self.slot.subscribe(),
        }
    }

    /// Load the model, or join a load already in flight.
    ///
    /// Starts a new fetch from Unloaded, and retries from Failed. `options`
    /// only apply when this call starts the fetch.
    pub async fn load(&self, options: LoadOptions) -> Result<Arc<dyn GlossModel>> {
        self.begin(options, true)?;
        self.wait().await
    }

    /// Return the model, loading it with default options if needed.
    ///
    /// Unlike `load`, a Failed loader fails fast with the stored reason.
    pub async fn ensure_ready(&self) -> Result<Arc<dyn GlossModel>> {
        if let Some(settled) = self.slot.borrow().settled() {
            return settled;
        }
        self.begin(LoadOptions::default(), false)?;
        self.wait().await
    }

    fn begin(&self, options: LoadOptions, retry_failed: bool) -> Result<()> {
        let mut start = false;
        let mut failed = None;

        self.slot.send_if_modified(|slot| match slot {
            Slot::Unloaded => {
                *slot = Slot::Loading;
                start = true;
                true
            }
            Slot::Failed(_) if retry_failed => {
                *slot = Slot::Loading;
                start = true;
                true
            }
            Slot::Failed(reason) => {
                failed = Some(reason.clone());
                false
            }
            Slot::Loading | Slot::Ready(_) => false,
        });

        if let Some(reason) = failed {
            return Err(SignError::ModelUnavailable { reason });
        }
        if start {
            self.spawn_fetch(options);
        }
        Ok(())
    }

    /// Runs the fetch detached from any caller, so abandoning a `load`
    /// future never strands the slot in Loading.
    fn spawn_fetch(&self, options: LoadOptions) {
        let source = self.source.clone();
        let slot = self.slot.clone();

        tokio::spawn(async move {
            tracing::info!("loading sign model");
            let fetch = tokio::spawn(async move { source.fetch(&options).await });

            let next = match fetch.await {
                Ok(Ok(model)) => {
                    tracing::info!(
                        model = model.name(),
                        labels = model.labels().len(),
                        "sign model ready"
                    );
                    Slot::Ready(model)
                }
                Ok(Err(e)) => {
                    tracing::warn!("sign model failed to load: {e}");
                    Slot::Failed(e.to_string())
                }
                Err(e) => {
                    tracing::error!("sign model load task panicked: {e}");
                    Slot::Failed(format!("model load task panicked: {e}"))
                }
            };
            slot.send_replace(next);
        });
    }

    async fn wait(&self) -> Result<Arc<dyn GlossModel>> {
        let mut rx = self.slot.subscribe();
        let slot = rx
            .wait_for(|slot| slot.settled().is_some())
            .await
            .map_err(|_| SignError::ModelUnavailable {
                reason: "model loader was dropped".to_string(),
            })?;

        slot.settled().unwrap_or_else(|| {
            Err(SignError::ModelUnavailable {
                reason: "model load did not settle".to_string(),
            })
        })
    }
}

/// Receives lifecycle transitions from a `ModelLoader`.
pub struct LifecycleWatcher {
    rx: watch::Receiver<Slot>,
}

impl LifecycleWatcher {
    /// Current state, marking it seen.
    pub fn current(&mut self) -> LifecycleState {
        self.rx.borrow_and_update().lifecycle()
    }

    /// Waits for the next transition.
    ///
    /// Returns `None` once the loader is gone.
    pub async fn changed(&mut self) -> Option<LifecycleState> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MockModel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source that counts fetches and fails until told otherwise.
    struct CountingSource {
        fetches: Arc<AtomicUsize>,
        fail_first: usize,
        delay: Duration,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                fetches: Arc::new(AtomicUsize::new(0)),
                fail_first: 0,
                delay: Duration::from_millis(20),
            }
        }

        fn failing_first(mut self, n: usize) -> Self {
            self.fail_first = n;
            self
        }
    }

    #[async_trait]
    impl ModelSource for CountingSource {
        async fn fetch(&self, options: &LoadOptions) -> Result<Arc<dyn GlossModel>> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if n < self.fail_first {
                return Err(SignError::AssetFetch {
                    location: options
                        .model_path
                        .clone()
                        .unwrap_or_else(|| "model.json".to_string()),
                    message: "connection refused".to_string(),
                });
            }
            Ok(Arc::new(MockModel::new(&["HELLO", "BYE"])))
        }
    }

    #[test]
    fn test_lifecycle_serializes_with_reason() {
        assert_eq!(
            serde_json::to_string(&LifecycleState::Ready).unwrap(),
            r#"{"state":"ready"}"#
        );
        assert_eq!(
            serde_json::to_string(&LifecycleState::Failed("boom".to_string())).unwrap(),
            r#"{"state":"failed","reason":"boom"}"#
        );
        assert_eq!(LifecycleState::Failed("x".to_string()).failure_reason(), Some("x"));
    }

    #[tokio::test]
    async fn test_load_transitions_to_ready() {
        let loader = ModelLoader::new(Arc::new(CountingSource::new()));
        assert_eq!(loader.lifecycle(), LifecycleState::Unloaded);
        assert!(loader.model().is_none());

        let model = loader.load(LoadOptions::default()).await.unwrap();
        assert_eq!(model.labels().len(), 2);
        assert_eq!(loader.lifecycle(), LifecycleState::Ready);
        assert!(loader.model().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_loads_fetch_once() {
        let source = CountingSource::new();
        let fetches = source.fetches.clone();
        let loader = ModelLoader::new(Arc::new(source));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load(LoadOptions::default()).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        // Later calls reuse the cached model
        loader.ensure_ready().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_failure() {
        let source = CountingSource::new().failing_first(usize::MAX);
        let fetches = source.fetches.clone();
        let loader = ModelLoader::new(Arc::new(source));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load(LoadOptions::default()).await })
            })
            .collect();

        let mut reasons = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Err(SignError::ModelUnavailable { reason }) => reasons.push(reason),
                Err(other) => panic!("Expected ModelUnavailable, got {}", other),
                Ok(_) => panic!("Expected failure"),
            }
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(reasons.windows(2).all(|w| w[0] == w[1]));
        assert!(reasons[0].contains("connection refused"), "got: {}", reasons[0]);
        assert!(matches!(loader.lifecycle(), LifecycleState::Failed(_)));
    }

    #[tokio::test]
    async fn test_ensure_ready_fails_fast_when_failed() {
        let source = CountingSource::new().failing_first(1);
        let fetches = source.fetches.clone();
        let loader = ModelLoader::new(Arc::new(source));

        assert!(loader.ensure_ready().await.is_err());
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        // No automatic retry
        match loader.ensure_ready().await {
            Err(SignError::ModelUnavailable { reason }) => {
                assert!(reason.contains("connection refused"));
            }
            _ => panic!("Expected fast failure"),
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_load_retries_after_failure() {
        let source = CountingSource::new().failing_first(1);
        let fetches = source.fetches.clone();
        let loader = ModelLoader::new(Arc::new(source));

        assert!(loader.load(LoadOptions::default()).await.is_err());
        assert!(loader.load(LoadOptions::default()).await.is_ok());
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert!(loader.lifecycle().is_ready());
    }

    #[tokio::test]
    async fn test_load_options_reach_source() {
        let source = CountingSource::new().failing_first(1);
        let loader = ModelLoader::new(Arc::new(source));

        let result = loader
            .load(LoadOptions::default().with_model_path("custom/model.json"))
            .await;
        match result {
            Err(SignError::ModelUnavailable { reason }) => {
                assert!(reason.contains("custom/model.json"), "got: {}", reason);
            }
            _ => panic!("Expected failure naming the override"),
        }
    }

    #[tokio::test]
    async fn test_abandoned_load_still_completes() {
        let loader = ModelLoader::new(Arc::new(CountingSource::new()));

        let pending = loader.load(LoadOptions::default());
        let _ = tokio::time::timeout(Duration::from_millis(1), pending).await;

        let mut watcher = loader.subscribe();
        let mut state = watcher.current();
        while !state.is_settled() {
            state = watcher.changed().await.unwrap();
        }
        assert_eq!(state, LifecycleState::Ready);
    }

    #[tokio::test]
    async fn test_watcher_sees_loading_then_ready() {
        let loader = ModelLoader::new(Arc::new(CountingSource::new()));
        let mut watcher = loader.subscribe();
        assert_eq!(watcher.current(), LifecycleState::Unloaded);

        let task = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load(LoadOptions::default()).await })
        };

        assert_eq!(watcher.changed().await, Some(LifecycleState::Loading));
        assert_eq!(watcher.changed().await, Some(LifecycleState::Ready));
        assert!(task.await.unwrap().is_ok());
    }
}
