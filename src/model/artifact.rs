//! Persisted model artifact: a trained classifier plus its feature schema.
//!
//! The artifact is a JSON document produced by the training side:
//!
//! ```json
//! {
//!   "feature_names": ["AccX_mean", "AccY_mean", "..."],
//!   "classifier": { "type": "random_forest", "trees": [ { "nodes": [...] } ] }
//! }
//! ```
//!
//! It is loaded once at startup. Any failure here is fatal to the service.

use crate::model::classifier::{Classifier, ClassifierError};
use crate::model::forest::RandomForest;
use crate::model::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors loading or saving a model artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// The supported classifier encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSpec {
    RandomForest(RandomForest),
}

impl Classifier for ClassifierSpec {
    fn classify(&self, features: &[f64]) -> Result<i64, ClassifierError> {
        match self {
            ClassifierSpec::RandomForest(forest) => forest.classify(features),
        }
    }
}

/// A trained classifier together with the ordered feature names it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: FeatureSchema,
    pub classifier: ClassifierSpec,
}

impl ModelArtifact {
    pub fn new(feature_names: FeatureSchema, classifier: ClassifierSpec) -> Self {
        Self {
            feature_names,
            classifier,
        }
    }

    /// Read and validate an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate an artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let io_err = |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Structural checks that must pass before the model may serve.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.feature_names.is_empty() {
            return Err(ArtifactError::Invalid(
                "feature schema is empty".to_string(),
            ));
        }
        match &self.classifier {
            ClassifierSpec::RandomForest(forest) => forest.validate(self.feature_names.len()),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.feature_names
    }

    /// Split into the shareable classifier and its schema.
    pub fn into_parts(self) -> (Arc<dyn Classifier>, FeatureSchema) {
        (Arc::new(self.classifier), self.feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::forest::DecisionTree;

    fn sample_artifact() -> ModelArtifact {
        ModelArtifact::new(
            FeatureSchema::windowed(),
            ClassifierSpec::RandomForest(RandomForest::new(vec![
                DecisionTree::stump(6, 10.0, 0, 1),
                DecisionTree::leaf(0),
            ])),
        )
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("model.json");

        let artifact = sample_artifact();
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, artifact);
        assert!(loaded.schema().matches_pipeline());
    }

    #[test]
    fn test_json_layout() {
        let json = serde_json::to_value(sample_artifact()).unwrap();
        assert_eq!(json["feature_names"][0], "AccX_mean");
        assert_eq!(json["classifier"]["type"], "random_forest");
        assert_eq!(json["classifier"]["trees"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = ModelArtifact::from_json("{\"feature_names\": [").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse(_)));
    }

    #[test]
    fn test_invalid_structure_is_rejected() {
        let json = r#"{
            "feature_names": ["a", "b"],
            "classifier": {
                "type": "random_forest",
                "trees": [{"nodes": [{"split": {"feature": 2, "threshold": 0.0, "left": 1, "right": 1}}, {"leaf": {"class": 0}}]}]
            }
        }"#;
        assert!(matches!(
            ModelArtifact::from_json(json),
            Err(ArtifactError::Invalid(_))
        ));

        let json = r#"{"feature_names": [], "classifier": {"type": "random_forest", "trees": []}}"#;
        assert!(matches!(
            ModelArtifact::from_json(json),
            Err(ArtifactError::Invalid(_))
        ));
    }

    #[test]
    fn test_into_parts_classifies() {
        let (classifier, schema) = sample_artifact().into_parts();
        assert_eq!(schema.len(), 16);
        let mut features = vec![0.0; 16];
        features[6] = 50.0;
        // votes 1 and 0 tie; smallest wins
        assert_eq!(classifier.classify(&features).unwrap(), 0);
    }
}
