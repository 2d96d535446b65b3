//! Ordered feature names a trained classifier expects.

use crate::core::features::FEATURE_NAMES;
use serde::{Deserialize, Serialize};

/// The input shape of a trained classifier: feature names in column order.
///
/// Captured at training time and stored with the model. At inference time
/// it is the only authority on how many values a request must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// The schema produced by this crate's windowing pipeline.
    pub fn windowed() -> Self {
        Self::new(FEATURE_NAMES.iter().map(|n| n.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether this schema lists the windowed features in pipeline order.
    pub fn matches_pipeline(&self) -> bool {
        self.names.iter().map(String::as_str).eq(FEATURE_NAMES.iter().copied())
    }
}
