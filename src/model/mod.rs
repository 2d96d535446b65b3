//! Trained model boundary.
//!
//! This module contains:
//! - The `Classifier` capability and its runtime faults
//! - The decision-tree ensemble used as the concrete classifier
//! - The feature schema stored with a model
//! - Artifact loading and the class index to label mapping

pub mod artifact;
pub mod classifier;
pub mod forest;
pub mod labels;
pub mod schema;

pub use artifact::{ArtifactError, ClassifierSpec, ModelArtifact};
pub use classifier::{Classifier, ClassifierError};
pub use forest::{DecisionTree, RandomForest, TreeNode};
pub use labels::BehaviorLabel;
pub use schema::FeatureSchema;
