//! Audit trail for served predictions.
//!
//! This module provides the durable per-day prediction log and the
//! in-memory counters operators use to spot faults.

pub mod log;
pub mod stats;

// Re-export commonly used types
pub use log::{LogError, PredictionLog, PredictionLogEntry};
pub use stats::{ServiceStats, SharedServiceStats, StatsSnapshot};
