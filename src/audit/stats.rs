//! Operator-facing counters for the prediction service.
//!
//! Tracks how requests ended, so faults that do not reach the caller
//! (such as a failed log append) stay visible to whoever runs the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Request outcome counters since process start.
#[derive(Debug)]
pub struct ServiceStats {
    /// Predictions returned to a caller
    predictions_served: AtomicU64,
    /// Predictions whose class index had no known label
    unknown_labels: AtomicU64,
    /// Requests rejected for a wrong feature count
    schema_mismatches: AtomicU64,
    /// Requests rejected for a NaN or infinite feature
    invalid_inputs: AtomicU64,
    /// Requests where the classifier faulted
    inference_faults: AtomicU64,
    /// Predictions that could not be written to the log
    persistence_faults: AtomicU64,
    started_at: DateTime<Utc>,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            unknown_labels: AtomicU64::new(0),
            schema_mismatches: AtomicU64::new(0),
            invalid_inputs: AtomicU64::new(0),
            inference_faults: AtomicU64::new(0),
            persistence_faults: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_prediction(&self) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_label(&self) {
        self.unknown_labels.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_schema_mismatch(&self) {
        self.schema_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_input(&self) {
        self.invalid_inputs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_fault(&self) {
        self.inference_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_fault(&self) {
        self.persistence_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            unknown_labels: self.unknown_labels.load(Ordering::Relaxed),
            schema_mismatches: self.schema_mismatches.load(Ordering::Relaxed),
            invalid_inputs: self.invalid_inputs.load(Ordering::Relaxed),
            inference_faults: self.inference_faults.load(Ordering::Relaxed),
            persistence_faults: self.persistence_faults.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Prediction Statistics:\n\
             - Predictions served: {}\n\
             - Unknown labels: {}\n\
             - Schema mismatches: {}\n\
             - Invalid inputs: {}\n\
             - Inference faults: {}\n\
             - Persistence faults: {}\n\
             - Uptime: {} seconds",
            stats.predictions_served,
            stats.unknown_labels,
            stats.schema_mismatches,
            stats.invalid_inputs,
            stats.inference_faults,
            stats.persistence_faults,
            stats.uptime_secs
        )
    }
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub predictions_served: u64,
    pub unknown_labels: u64,
    pub schema_mismatches: u64,
    pub invalid_inputs: u64,
    pub inference_faults: u64,
    pub persistence_faults: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Thread-safe shared counters.
pub type SharedServiceStats = Arc<ServiceStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = ServiceStats::new();

        stats.record_prediction();
        stats.record_prediction();
        stats.record_unknown_label();
        stats.record_schema_mismatch();
        stats.record_invalid_input();
        stats.record_persistence_fault();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.predictions_served, 2);
        assert_eq!(snapshot.unknown_labels, 1);
        assert_eq!(snapshot.schema_mismatches, 1);
        assert_eq!(snapshot.invalid_inputs, 1);
        assert_eq!(snapshot.inference_faults, 0);
        assert_eq!(snapshot.persistence_faults, 1);
    }

    #[test]
    fn test_summary_format() {
        let stats = ServiceStats::new();
        stats.record_inference_fault();
        let summary = stats.summary();

        assert!(summary.contains("Predictions served: 0"));
        assert!(summary.contains("Inference faults: 1"));
        assert!(summary.contains("Persistence faults"));
    }
}
