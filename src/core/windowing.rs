//! Fixed-size, non-overlapping windowing over a sensor sample sequence.
//!
//! Windows advance by their own length, so boundaries never overlap. A
//! trailing run shorter than the window size is dropped, not padded.

use crate::core::features::{compute_features, FeatureVector};
use crate::core::sample::SensorSample;
use crate::core::stats::majority;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Default number of samples per window (2 seconds at 10 Hz).
pub const WINDOW_SIZE: usize = 20;

/// The summary of one window, ready for training export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledWindow {
    /// Index of the window's first sample in the input sequence
    pub offset: usize,
    /// Per-channel statistics
    pub features: FeatureVector,
    /// Majority ground-truth class among the window's samples
    pub label: i64,
}

/// The default window size as a `NonZeroUsize`.
pub fn default_window_size() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(WINDOW_SIZE - 1)
}

/// Split `samples` into windows of exactly `window_size` samples.
///
/// The returned iterator is lazy and borrows `samples`; calling `windowize`
/// again on the same slice restarts it and produces identical output.
/// Exactly `samples.len() / window_size` windows are produced.
pub fn windowize(
    samples: &[SensorSample],
    window_size: NonZeroUsize,
) -> impl Iterator<Item = LabeledWindow> + '_ {
    let size = window_size.get();
    samples
        .chunks_exact(size)
        .enumerate()
        .filter_map(move |(index, chunk)| summarize_window(index * size, chunk))
}

/// Summarize one chunk. `chunks_exact` with a non-zero size never yields an
/// empty chunk, so `None` is unreachable in practice.
fn summarize_window(offset: usize, chunk: &[SensorSample]) -> Option<LabeledWindow> {
    debug_assert!(!chunk.is_empty(), "window at offset {offset} is empty");
    let label = majority(chunk.iter().map(|s| s.label))?;

    Some(LabeledWindow {
        offset,
        features: compute_features(chunk),
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::Channel;

    fn ramp(len: usize) -> Vec<SensorSample> {
        (0..len)
            .map(|i| {
                let t = i as f64;
                SensorSample::new(
                    [t * 0.1, -9.81 + t * 0.01, 0.5],
                    [t.sin(), t.cos(), 0.0],
                    (i % 3) as i64,
                )
            })
            .collect()
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_default_window_size() {
        assert_eq!(default_window_size().get(), WINDOW_SIZE);
    }

    #[test]
    fn test_window_count_is_floor_division() {
        for (len, w) in [(0, 20), (19, 20), (20, 20), (40, 20), (59, 20), (10, 3), (7, 1)] {
            let samples = ramp(len);
            assert_eq!(windowize(&samples, size(w)).count(), len / w, "len={len} w={w}");
        }
    }

    #[test]
    fn test_windows_do_not_overlap() {
        let samples = ramp(65);
        let offsets: Vec<usize> = windowize(&samples, size(20)).map(|w| w.offset).collect();
        assert_eq!(offsets, vec![0, 20, 40]);
    }

    #[test]
    fn test_remainder_is_dropped() {
        let mut samples = ramp(20);
        // A distinctive tail that would change the statistics if padded in
        samples.extend(vec![SensorSample::new([100.0; 3], [100.0; 3], 4); 5]);
        let windows: Vec<_> = windowize(&samples, size(20)).collect();
        assert_eq!(windows.len(), 1);
        assert!(windows[0].features.mean(Channel::AccX) < 2.0);
    }

    #[test]
    fn test_windowize_is_deterministic_and_restartable() {
        let samples = ramp(100);
        let first: Vec<_> = windowize(&samples, size(20)).collect();
        let second: Vec<_> = windowize(&samples, size(20)).collect();
        assert_eq!(first, second);

        let bits = |w: &LabeledWindow| -> Vec<u64> {
            w.features.as_slice().iter().map(|v| v.to_bits()).collect()
        };
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(bits(a), bits(b));
        }
    }

    #[test]
    fn test_majority_label_per_window() {
        let mut samples = Vec::new();
        for label in [1, 1, 2, 2, 2, 3, 3, 0, 0, 0] {
            samples.push(SensorSample::new([0.0; 3], [0.0; 3], label));
        }
        // first window: 1,1,2,2,2 -> 2; second: 3,3,0,0,0 -> 0
        let labels: Vec<i64> = windowize(&samples, size(5)).map(|w| w.label).collect();
        assert_eq!(labels, vec![2, 0]);
    }

    #[test]
    fn test_majority_tie_picks_smallest_class() {
        let samples: Vec<_> = [4, 1, 4, 1]
            .iter()
            .map(|&l| SensorSample::new([0.0; 3], [0.0; 3], l))
            .collect();
        let window = windowize(&samples, size(4)).next().unwrap();
        assert_eq!(window.label, 1);
    }

    #[test]
    fn test_single_sample_windows_have_zero_std() {
        let samples = ramp(3);
        for window in windowize(&samples, size(1)) {
            assert!(window.features.as_slice()[8..].iter().all(|&v| v == 0.0));
        }
    }
}
