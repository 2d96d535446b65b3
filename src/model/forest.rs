//! Decision-tree ensemble classifier.
//!
//! Trees are stored as flat node arrays with node 0 as the root. A split
//! sends a sample left when `x[feature] <= threshold`. The forest predicts
//! the majority class over all trees, ties going to the smallest class.

use crate::core::stats::majority;
use crate::model::artifact::ArtifactError;
use crate::model::classifier::{Classifier, ClassifierError};
use serde::{Deserialize, Serialize};

/// One node of a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
    },
}

/// A single decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// A tree that always answers `class`.
    pub fn leaf(class: i64) -> Self {
        Self::new(vec![TreeNode::Leaf { class }])
    }

    /// A depth-one tree: `left_class` when `x[feature] <= threshold`.
    pub fn stump(feature: usize, threshold: f64, left_class: i64, right_class: i64) -> Self {
        Self::new(vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { class: left_class },
            TreeNode::Leaf { class: right_class },
        ])
    }

    /// Walk from the root to a leaf.
    fn predict(&self, tree: usize, features: &[f64]) -> Result<i64, ClassifierError> {
        let mut node = 0;
        // A well-formed tree visits each node at most once per walk.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(node) {
                Some(TreeNode::Leaf { class }) => return Ok(*class),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value =
                        features
                            .get(*feature)
                            .ok_or(ClassifierError::MissingFeature {
                                tree,
                                feature: *feature,
                                available: features.len(),
                            })?;
                    node = if *value <= *threshold { *left } else { *right };
                }
                None => return Err(ClassifierError::MissingNode { tree, node }),
            }
        }
        Err(ClassifierError::Cycle {
            tree,
            steps: self.nodes.len(),
        })
    }

    fn validate(&self, tree: usize, feature_count: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::Invalid(format!("tree {tree} has no nodes")));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                threshold,
            } = node
            {
                if *feature >= feature_count {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {tree} node {index} splits on feature {feature}, schema has {feature_count}"
                    )));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {tree} node {index} has a child outside 0..{}",
                        self.nodes.len()
                    )));
                }
                if threshold.is_nan() {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {tree} node {index} has a NaN threshold"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Majority-vote ensemble of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(trees: Vec<DecisionTree>) -> Self {
        Self { trees }
    }

    /// Check the structure against the number of schema features.
    pub fn validate(&self, feature_count: usize) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("forest has no trees".to_string()));
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.validate(i, feature_count))
    }
}

impl Classifier for RandomForest {
    fn classify(&self, features: &[f64]) -> Result<i64, ClassifierError> {
        if let Some((index, &value)) = features.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteInput { index, value });
        }

        let votes = self
            .trees
            .iter()
            .enumerate()
            .map(|(i, tree)| tree.predict(i, features))
            .collect::<Result<Vec<_>, _>>()?;

        majority(votes).ok_or(ClassifierError::NoVote)
    }
}
