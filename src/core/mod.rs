//! Core functionality for the driver behavior pipeline.
//!
//! This module contains:
//! - Sensor sample types and derived magnitude channels
//! - Window construction over sample sequences
//! - Feature computation from windows

pub mod features;
pub mod sample;
pub mod stats;
pub mod windowing;

// Re-export commonly used types
pub use features::{compute_features, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use sample::{Channel, SensorSample};
pub use windowing::{default_window_size, windowize, LabeledWindow, WINDOW_SIZE};
