//! Model sources: the fetch-and-initialize step behind the loader.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::model::GlossModel;
use crate::model::assets::{AssetLocation, parse_labels};
use crate::model::linear::LinearGlossModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-load overrides of the configured asset locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    /// Overrides where the weights are fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    /// Overrides where the label vocabulary is fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_path: Option<String>,
}

impl LoadOptions {
    pub fn with_model_path(mut self, path: impl Into<String>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn with_labels_path(mut self, path: impl Into<String>) -> Self {
        self.labels_path = Some(path.into());
        self
    }
}

/// Fetches and initializes a model.
///
/// Called at most once per successful load; the loader caches the result.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn fetch(&self, options: &LoadOptions) -> Result<Arc<dyn GlossModel>>;
}

/// Loads a `LinearGlossModel` from a weights file and a label vocabulary.
#[derive(Debug, Clone)]
pub struct AssetModelSource {
    model_path: String,
    labels_path: String,
}

impl AssetModelSource {
    pub fn new(model_path: impl Into<String>, labels_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            labels_path: labels_path.into(),
        }
    }

    /// Creates a source for the configured asset locations.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(&config.model_path, &config.labels_path)
    }

    /// Resolves the locations a load with `options` would use.
    pub fn locations(&self, options: &LoadOptions) -> (AssetLocation, AssetLocation) {
        let model = options.model_path.as_deref().unwrap_or(&self.model_path);
        let labels = options.labels_path.as_deref().unwrap_or(&self.labels_path);
        (AssetLocation::parse(model), AssetLocation::parse(labels))
    }
}

#[async_trait]
impl ModelSource for AssetModelSource {
    async fn fetch(&self, options: &LoadOptions) -> Result<Arc<dyn GlossModel>> {
        let (model_location, labels_location) = self.locations(options);
        tracing::debug!(
            model = %model_location,
            labels = %labels_location,
            "fetching model assets"
        );

        let (weights, labels) = tokio::try_join!(model_location.fetch(), labels_location.fetch())?;
        let labels = parse_labels(&labels_location.to_string(), &labels)?;
        let model = LinearGlossModel::from_json(&weights, labels)?;

        Ok(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignError;
    use std::fs;

    fn write_assets(dir: &std::path::Path) -> (String, String) {
        let model = dir.join("model.json");
        let labels = dir.join("labels.txt");
        fs::write(
            &model,
            r#"{"name":"tiny","input_dim":3,"weights":[[1,0,0],[0,1,0]],"bias":[0,0]}"#,
        )
        .unwrap();
        fs::write(&labels, "HELLO\nBYE\n").unwrap();
        (
            model.to_string_lossy().to_string(),
            labels.to_string_lossy().to_string(),
        )
    }

    #[test]
    fn test_load_options_camel_case() {
        let options: LoadOptions =
            serde_json::from_str(r#"{"modelPath":"a.json","labelsPath":"b.txt"}"#).unwrap();
        assert_eq!(
            options,
            LoadOptions::default()
                .with_model_path("a.json")
                .with_labels_path("b.txt")
        );
        assert_eq!(serde_json::to_string(&LoadOptions::default()).unwrap(), "{}");
    }

    #[test]
    fn test_options_override_locations() {
        let source = AssetModelSource::new("default/model.json", "default/labels.txt");
        let (model, labels) = source.locations(&LoadOptions::default().with_labels_path("x.txt"));
        assert_eq!(model.to_string(), "default/model.json");
        assert_eq!(labels.to_string(), "x.txt");
    }

    #[tokio::test]
    async fn test_fetch_builds_model() {
        let dir = tempfile::tempdir().unwrap();
        let (model_path, labels_path) = write_assets(dir.path());

        let source = AssetModelSource::new(model_path, labels_path);
        let model = source.fetch(&LoadOptions::default()).await.unwrap();

        assert_eq!(model.name(), "tiny");
        assert_eq!(model.labels(), &["HELLO".to_string(), "BYE".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_missing_labels_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (model_path, _) = write_assets(dir.path());
        let missing = dir.path().join("nope.txt").to_string_lossy().to_string();

        let source = AssetModelSource::new(model_path, missing);
        let result = source.fetch(&LoadOptions::default()).await;
        assert!(matches!(result, Err(SignError::AssetFetch { .. })));
    }

    #[tokio::test]
    async fn test_fetch_label_count_mismatch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (model_path, _) = write_assets(dir.path());
        let labels = dir.path().join("three.txt");
        fs::write(&labels, "A\nB\nC\n").unwrap();

        let source = AssetModelSource::new(model_path, labels.to_string_lossy().to_string());
        let result = source.fetch(&LoadOptions::default()).await;
        assert!(matches!(result, Err(SignError::AssetParse { .. })));
    }
}
