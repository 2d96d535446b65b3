//! Human-readable driver behavior categories.

use serde::{Deserialize, Serialize};

/// Behavior category resolved from a classifier's class index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorLabel {
    Normal,
    Aggressive,
    Risky,
    Drowsy,
    Dangerous,
    /// Any class index the label set does not know about
    Unknown,
}

impl BehaviorLabel {
    /// The five known categories, indexed by class.
    pub const KNOWN: [BehaviorLabel; 5] = [
        BehaviorLabel::Normal,
        BehaviorLabel::Aggressive,
        BehaviorLabel::Risky,
        BehaviorLabel::Drowsy,
        BehaviorLabel::Dangerous,
    ];

    /// Map a class index to its label. Never fails: indices outside
    /// `0..=4` resolve to `Unknown`.
    pub fn from_class(index: i64) -> Self {
        match index {
            0 => BehaviorLabel::Normal,
            1 => BehaviorLabel::Aggressive,
            2 => BehaviorLabel::Risky,
            3 => BehaviorLabel::Drowsy,
            4 => BehaviorLabel::Dangerous,
            _ => BehaviorLabel::Unknown,
        }
    }

    /// Class index of a known label.
    pub fn class_index(self) -> Option<i64> {
        Self::KNOWN
            .iter()
            .position(|&l| l == self)
            .map(|i| i as i64)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BehaviorLabel::Normal => "Normal",
            BehaviorLabel::Aggressive => "Aggressive",
            BehaviorLabel::Risky => "Risky",
            BehaviorLabel::Drowsy => "Drowsy",
            BehaviorLabel::Dangerous => "Dangerous",
            BehaviorLabel::Unknown => "Unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != BehaviorLabel::Unknown
    }
}

impl std::fmt::Display for BehaviorLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
