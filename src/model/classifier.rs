//! The classification capability consumed by the prediction service.

use thiserror::Error;

/// A trained classifier: one feature vector in, one class index out.
///
/// Implementations are read-only after loading and are shared across
/// concurrent requests.
pub trait Classifier: Send + Sync {
    fn classify(&self, features: &[f64]) -> Result<i64, ClassifierError>;
}

/// Faults raised while evaluating a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("feature {index} is not a finite number ({value})")]
    NonFiniteInput { index: usize, value: f64 },

    #[error("tree {tree} references node {node}, which does not exist")]
    MissingNode { tree: usize, node: usize },

    #[error("tree {tree} references feature {feature}, but only {available} were supplied")]
    MissingFeature {
        tree: usize,
        feature: usize,
        available: usize,
    },

    #[error("tree {tree} did not reach a leaf within {steps} steps")]
    Cycle { tree: usize, steps: usize },

    #[error("classifier produced no vote")]
    NoVote,

    #[error("classifier panicked: {0}")]
    Panicked(String),
}
