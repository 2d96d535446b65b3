//! Feature computation from sensor windows.
//!
//! Every window is summarized by the mean and sample standard deviation of
//! each of the eight channels (six raw axes plus two magnitudes), giving a
//! 16-value vector in a fixed, named order.

use crate::core::sample::{Channel, SensorSample};
use crate::core::stats::{mean, sample_std_dev};
use serde::{Deserialize, Serialize};

/// Number of values in a feature vector.
pub const FEATURE_COUNT: usize = 16;

/// Feature names in vector order: all means first, then all standard deviations.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "AccX_mean",
    "AccY_mean",
    "AccZ_mean",
    "GyroX_mean",
    "GyroY_mean",
    "GyroZ_mean",
    "AccMagnitude_mean",
    "GyroMagnitude_mean",
    "AccX_std",
    "AccY_std",
    "AccZ_std",
    "GyroX_std",
    "GyroY_std",
    "GyroZ_std",
    "AccMagnitude_std",
    "GyroMagnitude_std",
];

/// Statistical summary of one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Copy the values out, e.g. to build a prediction request.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    /// Mean of a channel over the window.
    pub fn mean(&self, channel: Channel) -> f64 {
        self.values[channel_index(channel)]
    }

    /// Sample standard deviation of a channel over the window.
    pub fn std_dev(&self, channel: Channel) -> f64 {
        self.values[Channel::ALL.len() + channel_index(channel)]
    }

    /// Look up a value by feature name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.values[i])
    }

    /// Name/value pairs in vector order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

fn channel_index(channel: Channel) -> usize {
    Channel::ALL
        .iter()
        .position(|&c| c == channel)
        .unwrap_or_default()
}

/// Compute the feature vector of a window of samples.
///
/// Magnitudes are derived per sample before their statistics are taken.
pub fn compute_features(window: &[SensorSample]) -> FeatureVector {
    let mut values = [0.0; FEATURE_COUNT];
    let mut series = Vec::with_capacity(window.len());

    for (i, channel) in Channel::ALL.into_iter().enumerate() {
        series.clear();
        series.extend(window.iter().map(|s| s.channel(channel)));
        values[i] = mean(&series);
        values[Channel::ALL.len() + i] = sample_std_dev(&series);
    }

    FeatureVector { values }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_window(acc: [f64; 3], gyro: [f64; 3], n: usize) -> Vec<SensorSample> {
        vec![SensorSample::new(acc, gyro, 0); n]
    }

    #[test]
    fn test_feature_names_follow_channel_order() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(FEATURE_NAMES[i], format!("{}_mean", channel.name()));
            assert_eq!(FEATURE_NAMES[i + 8], format!("{}_std", channel.name()));
        }
    }

    #[test]
    fn test_acc_magnitude_mean_is_exact() {
        let window = constant_window([3.0, 4.0, 0.0], [0.0, 0.0, 0.0], 20);
        let features = compute_features(&window);
        assert_eq!(features.mean(Channel::AccMagnitude), 5.0);
        assert_eq!(features.get("AccMagnitude_mean"), Some(5.0));
    }

    #[test]
    fn test_zero_variance_window() {
        let window = constant_window([0.3, -9.81, 0.1], [0.01, 0.02, 0.03], 20);
        let features = compute_features(&window);
        for channel in Channel::ALL {
            assert_eq!(features.std_dev(channel), 0.0, "{channel} std");
        }
        assert!(features.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_mean_and_std_of_varying_axis() {
        let window: Vec<SensorSample> = (0..4)
            .map(|i| SensorSample::new([i as f64, 0.0, 0.0], [0.0; 3], 1))
            .collect();
        let features = compute_features(&window);

        assert!((features.mean(Channel::AccX) - 1.5).abs() < 1e-12);
        // values 0..=3: squared deviations sum to 5, n - 1 = 3
        let expected = (5.0_f64 / 3.0).sqrt();
        assert!((features.std_dev(Channel::AccX) - expected).abs() < 1e-12);
        assert!((features.get("AccX_std").unwrap_or_default() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_named_pairs_cover_every_feature() {
        let window = constant_window([1.0, 2.0, 2.0], [0.0; 3], 5);
        let features = compute_features(&window);
        let named: Vec<_> = features.named().collect();
        assert_eq!(named.len(), FEATURE_COUNT);
        assert_eq!(named[6], ("AccMagnitude_mean", 3.0));
        assert_eq!(features.get("missing"), None);
    }
}
