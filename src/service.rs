//! Online prediction service.
//!
//! Holds the classifier and its schema, loaded once and never changed, and
//! turns a submitted feature vector into a labelled prediction plus one
//! audit record.
//!
//! A request goes through four stages: validate the features, run the
//! classifier, resolve the label, append to the log. The first two can
//! reject the request. Validation covers the count and finiteness of the
//! values, since a NaN or infinity cannot be written to the JSON log. A failed append does not: the prediction is still
//! returned and the persistence fault is reported next to it.

use crate::audit::{LogError, PredictionLog, PredictionLogEntry, ServiceStats, SharedServiceStats};
use crate::model::{
    ArtifactError, BehaviorLabel, Classifier, ClassifierError, FeatureSchema, ModelArtifact,
};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// A classifier decision with its resolved label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: i64,
    pub predicted_label: BehaviorLabel,
}

/// The result of a prediction that passed validation and inference.
///
/// `persisted` carries the outcome of the log append separately, so a
/// logging fault never hides the prediction itself.
#[derive(Debug)]
pub struct PredictionOutcome {
    pub prediction: Prediction,
    /// Log file written to, or why the append failed
    pub persisted: Result<PathBuf, LogError>,
}

impl PredictionOutcome {
    pub fn is_logged(&self) -> bool {
        self.persisted.is_ok()
    }
}

/// Reasons a prediction request is rejected.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The caller sent the wrong number of features.
    #[error("Expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// A feature is NaN or infinite.
    #[error("Feature {index} is not a finite number ({value})")]
    NonFiniteFeature { index: usize, value: f64 },

    /// The classifier failed on a well-formed request.
    #[error("Inference failed: {0}")]
    Inference(#[source] ClassifierError),
}

impl PredictError {
    /// Whether the fault lies with the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictError::SchemaMismatch { .. } | PredictError::NonFiniteFeature { .. }
        )
    }
}

/// Faults that stop the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Log(#[from] LogError),
}

/// The loaded model, its schema and the prediction log.
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    schema: FeatureSchema,
    log: PredictionLog,
    stats: SharedServiceStats,
}

impl PredictionService {
    pub fn new(classifier: Arc<dyn Classifier>, schema: FeatureSchema, log: PredictionLog) -> Self {
        Self {
            classifier,
            schema,
            log,
            stats: Arc::new(ServiceStats::new()),
        }
    }

    pub fn from_artifact(artifact: ModelArtifact, log: PredictionLog) -> Self {
        let (classifier, schema) = artifact.into_parts();
        Self::new(classifier, schema, log)
    }

    /// Load the model artifact and open the log directory.
    pub fn load(model_path: impl AsRef<Path>, log_dir: impl Into<PathBuf>) -> Result<Self, StartupError> {
        let model_path = model_path.as_ref();
        let artifact = ModelArtifact::load(model_path)?;
        tracing::info!(
            path = %model_path.display(),
            features = artifact.schema().len(),
            "Loaded model and features"
        );
        if !artifact.schema().matches_pipeline() {
            tracing::warn!("Model schema differs from the windowing pipeline's feature order");
        }

        let log = PredictionLog::open(log_dir)?;
        Ok(Self::from_artifact(artifact, log))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    pub fn stats(&self) -> &SharedServiceStats {
        &self.stats
    }

    /// Classify one feature vector and record the prediction.
    pub fn predict(&self, features: &[f64]) -> Result<PredictionOutcome, PredictError> {
        let expected = self.schema.len();
        if features.len() != expected {
            self.stats.record_schema_mismatch();
            tracing::warn!(expected, actual = features.len(), "Rejected feature vector");
            return Err(PredictError::SchemaMismatch {
                expected,
                actual: features.len(),
            });
        }

        if let Some((index, &value)) = features.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            self.stats.record_invalid_input();
            tracing::warn!(index, value, "Rejected non-finite feature");
            return Err(PredictError::NonFiniteFeature { index, value });
        }

        let predicted_class = self.classify(features).map_err(|e| {
            self.stats.record_inference_fault();
            tracing::error!(error = %e, "Prediction failed");
            PredictError::Inference(e)
        })?;

        let predicted_label = BehaviorLabel::from_class(predicted_class);
        if !predicted_label.is_known() {
            self.stats.record_unknown_label();
            tracing::warn!(predicted_class, "Classifier returned an unmapped class");
        }
        self.stats.record_prediction();

        let entry = PredictionLogEntry::now(
            features.to_vec(),
            predicted_class,
            predicted_label.as_str(),
        );
        let persisted = self.log.append(&entry);
        if let Err(ref e) = persisted {
            self.stats.record_persistence_fault();
            tracing::error!(error = %e, "Failed to persist prediction");
        }

        tracing::debug!(predicted_class, label = %predicted_label, "Prediction served");
        Ok(PredictionOutcome {
            prediction: Prediction {
                predicted_class,
                predicted_label,
            },
            persisted,
        })
    }

    /// Run the classifier, converting a panic into a classifier fault.
    fn classify(&self, features: &[f64]) -> Result<i64, ClassifierError> {
        catch_unwind(AssertUnwindSafe(|| self.classifier.classify(features))).unwrap_or_else(
            |payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ClassifierError::Panicked(message))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassifierSpec, DecisionTree, RandomForest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed class and counts invocations.
    struct FixedClassifier {
        class: i64,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(class: i64) -> Arc<Self> {
            Arc::new(Self {
                class,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Classifier for FixedClassifier {
        fn classify(&self, _features: &[f64]) -> Result<i64, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.class)
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn classify(&self, _features: &[f64]) -> Result<i64, ClassifierError> {
            Err(ClassifierError::NoVote)
        }
    }

    struct PanickingClassifier;

    impl Classifier for PanickingClassifier {
        fn classify(&self, _features: &[f64]) -> Result<i64, ClassifierError> {
            panic!("model state corrupted");
        }
    }

    fn service_with(classifier: Arc<dyn Classifier>, dir: &Path) -> PredictionService {
        let log = PredictionLog::open(dir.join("logs")).unwrap();
        PredictionService::new(classifier, FeatureSchema::windowed(), log)
    }

    fn log_files(service: &PredictionService) -> usize {
        std::fs::read_dir(service.log().dir()).unwrap().count()
    }

    fn logged(outcome: &PredictionOutcome) -> Vec<PredictionLogEntry> {
        let path = outcome.persisted.as_ref().unwrap();
        PredictionLog::read_file(path).unwrap()
    }

    #[test]
    fn test_schema_mismatch_skips_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = FixedClassifier::new(0);
        let service = service_with(classifier.clone(), dir.path());

        for len in [0, 15, 17, 60] {
            let err = service.predict(&vec![0.0; len]).unwrap_err();
            assert!(err.is_client_error());
            assert_eq!(err.to_string(), format!("Expected 16 features, got {len}"));
        }

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.stats().snapshot().schema_mismatches, 4);
        assert_eq!(log_files(&service), 0);
    }

    #[test]
    fn test_every_known_class_maps_to_its_label() {
        let dir = tempfile::tempdir().unwrap();
        let names = ["Normal", "Aggressive", "Risky", "Drowsy", "Dangerous"];
        for (class, name) in names.iter().enumerate() {
            let service = service_with(FixedClassifier::new(class as i64), dir.path());
            let outcome = service.predict(&[0.0; 16]).unwrap();
            assert_eq!(outcome.prediction.predicted_class, class as i64);
            assert_eq!(outcome.prediction.predicted_label.as_str(), *name);
        }
    }

    #[test]
    fn test_unknown_class_is_served_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(FixedClassifier::new(9), dir.path());

        let outcome = service.predict(&[1.0; 16]).unwrap();
        assert_eq!(outcome.prediction.predicted_label, BehaviorLabel::Unknown);
        assert!(outcome.is_logged());

        let entries = logged(&outcome);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].predicted_class, 9);
        assert_eq!(entries[0].predicted_label, "Unknown");
        assert_eq!(service.stats().snapshot().unknown_labels, 1);
    }

    #[test]
    fn test_log_has_one_record_per_prediction_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let forest = RandomForest::new(vec![DecisionTree::stump(0, 0.5, 0, 1)]);
        let (classifier, schema) =
            ModelArtifact::new(FeatureSchema::windowed(), ClassifierSpec::RandomForest(forest))
                .into_parts();
        let service =
            PredictionService::new(classifier, schema, PredictionLog::open(dir.path()).unwrap());

        let inputs: Vec<Vec<f64>> = (0..6)
            .map(|i| {
                let mut v = vec![0.0; 16];
                v[0] = (i % 2) as f64;
                v[1] = i as f64;
                v
            })
            .collect();
        let mut paths: Vec<PathBuf> = Vec::new();
        for input in &inputs {
            let path = service.predict(input).unwrap().persisted.unwrap();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        let entries: Vec<PredictionLogEntry> = paths
            .iter()
            .flat_map(|path| PredictionLog::read_file(path).unwrap())
            .collect();
        assert_eq!(entries.len(), inputs.len());
        for (entry, input) in entries.iter().zip(&inputs) {
            assert_eq!(&entry.features, input);
            assert_eq!(entry.predicted_class, input[0] as i64);
        }
    }

    #[test]
    fn test_classifier_fault_is_inference_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(Arc::new(FailingClassifier), dir.path());

        let err = service.predict(&[0.0; 16]).unwrap_err();

        assert!(!err.is_client_error());
        assert!(matches!(err, PredictError::Inference(ClassifierError::NoVote)));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(service.stats().snapshot().inference_faults, 1);
        assert_eq!(log_files(&service), 0);
    }

    #[test]
    fn test_non_finite_features_are_rejected_before_classifying() {
        let dir = tempfile::tempdir().unwrap();
        // Accepts anything, so only the service stands between NaN and the log.
        let classifier = FixedClassifier::new(2);
        let log = PredictionLog::open(dir.path().join("logs")).unwrap();
        let service = PredictionService::new(
            classifier.clone(),
            FeatureSchema::new(vec!["a".to_string()]),
            log,
        );

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = service.predict(&[value]).unwrap_err();
            assert!(err.is_client_error());
            assert!(matches!(err, PredictError::NonFiniteFeature { index: 0, .. }));
        }

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.stats().snapshot().invalid_inputs, 3);
        assert_eq!(log_files(&service), 0);

        // A finite vector afterwards still logs a record that reads back.
        let outcome = service.predict(&[0.25]).unwrap();
        assert_eq!(logged(&outcome).len(), 1);
    }

    #[test]
    fn test_classifier_panic_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(Arc::new(PanickingClassifier), dir.path());

        let err = service.predict(&[0.0; 16]).unwrap_err();
        assert!(matches!(
            err,
            PredictError::Inference(ClassifierError::Panicked(ref m)) if m.contains("corrupted")
        ));
    }

    #[test]
    fn test_persistence_fault_keeps_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(FixedClassifier::new(1), dir.path());

        // Replace the log directory with a plain file so appends fail.
        let logs = dir.path().join("logs");
        std::fs::remove_dir_all(&logs).unwrap();
        std::fs::write(&logs, b"not a directory").unwrap();

        let outcome = service.predict(&[0.5; 16]).unwrap();
        assert_eq!(outcome.prediction.predicted_label, BehaviorLabel::Aggressive);
        assert!(!outcome.is_logged());
        assert!(matches!(outcome.persisted, Err(LogError::Io { .. })));

        let stats = service.stats().snapshot();
        assert_eq!(stats.predictions_served, 1);
        assert_eq!(stats.persistence_faults, 1);
    }

    #[test]
    fn test_load_rejects_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result = PredictionService::load(dir.path().join("missing.json"), dir.path().join("logs"));
        assert!(matches!(result, Err(StartupError::Artifact(_))));
    }

    #[test]
    fn test_prediction_json_shape() {
        let prediction = Prediction {
            predicted_class: 3,
            predicted_label: BehaviorLabel::Drowsy,
        };
        let json = serde_json::to_value(prediction).unwrap();
        assert_eq!(json, serde_json::json!({"predicted_class": 3, "predicted_label": "Drowsy"}));
    }
}
