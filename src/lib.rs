//! Driver Behavior Service - windowed motion features and online classification.
//!
//! This library turns vehicle-motion sensor recordings (triaxial acceleration
//! and angular velocity) into fixed-length statistical feature vectors, and
//! serves behavior predictions for such vectors with an auditable log of
//! every prediction made.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Driver Behavior Service                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Ingest    │──▶│  Windowing  │──▶│  Features   │──▶ CSV  │
//! │  │  (CSV rows) │   │ (20 samples)│   │ (16 stats)  │ (train) │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                                                              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Server    │──▶│ Prediction  │──▶│ Prediction  │         │
//! │  │  (/predict) │   │   Service   │   │ Log (JSONL) │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use driver_behavior_service::{core, service::PredictionService};
//!
//! let samples = vec![core::SensorSample::new([3.0, 4.0, 0.0], [0.0; 3], 0); 40];
//! let windows: Vec<_> = core::windowize(&samples, core::default_window_size()).collect();
//! assert_eq!(windows.len(), 2);
//!
//! let service = PredictionService::load("driver_behavior_model.json", "logs")
//!     .expect("Failed to load model");
//! let outcome = service.predict(windows[0].features.as_slice())
//!     .expect("Prediction failed");
//! println!("{}", outcome.prediction.predicted_label);
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod ingest;
pub mod model;
pub mod server;
pub mod service;

// Re-export key types at crate root for convenience
pub use audit::{PredictionLog, PredictionLogEntry, ServiceStats, StatsSnapshot};
pub use config::Config;
pub use crate::core::{compute_features, windowize, FeatureVector, LabeledWindow, SensorSample};
pub use model::{BehaviorLabel, Classifier, FeatureSchema, ModelArtifact};
pub use service::{PredictError, Prediction, PredictionOutcome, PredictionService};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
