//! Vehicle-motion sensor sample types.
//!
//! A sample is one row of the cleaned sensor stream: triaxial acceleration,
//! triaxial angular velocity and the ground-truth class recorded with it.

use serde::{Deserialize, Serialize};

/// A single triaxial accelerometer + gyroscope reading.
///
/// Samples are immutable once ingested. Rows with a missing field are
/// rejected by the loader and never become samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    /// Ground-truth class index (training data only)
    pub label: i64,
}

impl SensorSample {
    /// Create a sample from acceleration and gyroscope triples.
    pub fn new(acc: [f64; 3], gyro: [f64; 3], label: i64) -> Self {
        Self {
            acc_x: acc[0],
            acc_y: acc[1],
            acc_z: acc[2],
            gyro_x: gyro[0],
            gyro_y: gyro[1],
            gyro_z: gyro[2],
            label,
        }
    }

    /// Euclidean norm of the acceleration vector.
    pub fn acc_magnitude(&self) -> f64 {
        (self.acc_x.powi(2) + self.acc_y.powi(2) + self.acc_z.powi(2)).sqrt()
    }

    /// Euclidean norm of the angular velocity vector.
    pub fn gyro_magnitude(&self) -> f64 {
        (self.gyro_x.powi(2) + self.gyro_y.powi(2) + self.gyro_z.powi(2)).sqrt()
    }

    /// Value of one channel, including the derived magnitudes.
    pub fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::AccX => self.acc_x,
            Channel::AccY => self.acc_y,
            Channel::AccZ => self.acc_z,
            Channel::GyroX => self.gyro_x,
            Channel::GyroY => self.gyro_y,
            Channel::GyroZ => self.gyro_z,
            Channel::AccMagnitude => self.acc_magnitude(),
            Channel::GyroMagnitude => self.gyro_magnitude(),
        }
    }
}

/// Signal channels summarized per window.
///
/// The declaration order is the feature order: six raw axes followed by
/// the two derived magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    AccX,
    AccY,
    AccZ,
    GyroX,
    GyroY,
    GyroZ,
    AccMagnitude,
    GyroMagnitude,
}

impl Channel {
    /// All channels in feature order.
    pub const ALL: [Channel; 8] = [
        Channel::AccX,
        Channel::AccY,
        Channel::AccZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
        Channel::AccMagnitude,
        Channel::GyroMagnitude,
    ];

    /// The six channels read directly from the sensor.
    pub const RAW: [Channel; 6] = [
        Channel::AccX,
        Channel::AccY,
        Channel::AccZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
    ];

    /// Column name used in CSV files and feature names.
    pub fn name(self) -> &'static str {
        match self {
            Channel::AccX => "AccX",
            Channel::AccY => "AccY",
            Channel::AccZ => "AccZ",
            Channel::GyroX => "GyroX",
            Channel::GyroY => "GyroY",
            Channel::GyroZ => "GyroZ",
            Channel::AccMagnitude => "AccMagnitude",
            Channel::GyroMagnitude => "GyroMagnitude",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitudes() {
        let sample = SensorSample::new([3.0, 4.0, 0.0], [0.0, 0.0, 2.0], 0);
        assert_eq!(sample.acc_magnitude(), 5.0);
        assert_eq!(sample.gyro_magnitude(), 2.0);
        assert_eq!(sample.channel(Channel::AccMagnitude), 5.0);
    }

    #[test]
    fn test_channel_order() {
        assert_eq!(&Channel::ALL[..6], &Channel::RAW[..]);
        assert_eq!(Channel::ALL[6].name(), "AccMagnitude");
        assert_eq!(Channel::GyroZ.to_string(), "GyroZ");
    }
}
