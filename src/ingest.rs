//! Batch preparation of raw sensor recordings for training.
//!
//! Loads a raw CSV recording, drops incomplete rows, derives magnitude
//! channels with their rolling means, and exports the windowed feature
//! table. The whole job runs single-threaded from start to finish.
//!
//! Expected input columns (order free, extra columns ignored):
//! `AccX, AccY, AccZ, GyroX, GyroY, GyroZ, Target(Class)`.

use crate::core::features::FEATURE_NAMES;
use crate::core::sample::{Channel, SensorSample};
use crate::core::stats;
use crate::core::windowing::{windowize, LabeledWindow};
use csv::{ReaderBuilder, StringRecord, Writer};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column holding the ground-truth class in raw recordings.
pub const LABEL_COLUMN: &str = "Target(Class)";

/// Column holding the window label in the exported feature table.
pub const TARGET_COLUMN: &str = "Target";

/// Default trailing window for the rolling magnitude means.
pub const ROLLING_WINDOW: usize = 5;

/// Errors from loading or exporting sensor data.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required column '{0}'")]
    MissingColumn(String),
}

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Data rows in the file
    pub rows_read: usize,
    /// Rows discarded for a missing or unreadable value
    pub rows_dropped: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}

/// Column positions of the required fields in a header.
struct ColumnMap {
    channels: [usize; 6],
    label: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
        };

        let mut channels = [0; 6];
        for (slot, channel) in channels.iter_mut().zip(Channel::RAW) {
            *slot = find(channel.name())?;
        }
        Ok(Self {
            channels,
            label: find(LABEL_COLUMN)?,
        })
    }

    /// Parse a record, or `None` if any required field is missing.
    fn parse(&self, record: &StringRecord) -> Option<SensorSample> {
        let mut values = [0.0; 6];
        for (value, &index) in values.iter_mut().zip(&self.channels) {
            *value = parse_value(record.get(index)?)?;
        }
        let label = parse_label(record.get(self.label)?)?;
        Some(SensorSample::new(
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
            label,
        ))
    }
}

fn parse_value(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Labels may be written as integers or as integral floats ("2.0").
fn parse_label(field: &str) -> Option<i64> {
    let field = field.trim();
    field.parse::<i64>().ok().or_else(|| {
        parse_value(field)
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64)
    })
}

/// Read samples from any CSV source, dropping incomplete rows.
pub fn read_samples<R: Read>(reader: R) -> Result<(Vec<SensorSample>, LoadReport), IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(reader.headers()?)?;
    let mut samples = Vec::new();
    let mut report = LoadReport::default();

    for result in reader.records() {
        let record = result?;
        report.rows_read += 1;
        match columns.parse(&record) {
            Some(sample) => samples.push(sample),
            None => report.rows_dropped += 1,
        }
    }

    Ok((samples, report))
}

/// Load samples from a CSV file.
pub fn load_samples_csv(
    path: impl AsRef<Path>,
) -> Result<(Vec<SensorSample>, LoadReport), IngestError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_samples(file)
}

/// A sample with its derived magnitude channels and their rolling means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanedRow {
    pub sample: SensorSample,
    pub acc_magnitude: f64,
    pub gyro_magnitude: f64,
    /// Mean of `acc_magnitude` over this row and the preceding ones
    pub acc_magnitude_rolling: f64,
    /// Mean of `gyro_magnitude` over this row and the preceding ones
    pub gyro_magnitude_rolling: f64,
}

/// Derive magnitudes and trailing rolling means.
///
/// The first `rolling_window - 1` rows have an incomplete history and are
/// dropped, so the output has `len - rolling_window + 1` rows.
pub fn clean(samples: &[SensorSample], rolling_window: NonZeroUsize) -> Vec<CleanedRow> {
    samples
        .windows(rolling_window.get())
        .filter_map(|history| {
            let sample = *history.last()?;
            let acc: Vec<f64> = history.iter().map(SensorSample::acc_magnitude).collect();
            let gyro: Vec<f64> = history.iter().map(SensorSample::gyro_magnitude).collect();
            Some(CleanedRow {
                sample,
                acc_magnitude: sample.acc_magnitude(),
                gyro_magnitude: sample.gyro_magnitude(),
                acc_magnitude_rolling: stats::mean(&acc),
                gyro_magnitude_rolling: stats::mean(&gyro),
            })
        })
        .collect()
}

/// Descriptive statistics for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel: Channel,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Count, mean, sample std, min and max of every channel.
pub fn summarize(samples: &[SensorSample]) -> Vec<ChannelSummary> {
    Channel::ALL
        .into_iter()
        .map(|channel| {
            let values: Vec<f64> = samples.iter().map(|s| s.channel(channel)).collect();
            ChannelSummary {
                channel,
                count: values.len(),
                mean: stats::mean(&values),
                std: stats::sample_std_dev(&values),
                min: stats::min(&values),
                max: stats::max(&values),
            }
        })
        .collect()
}

/// Write cleaned rows with their derived columns.
pub fn write_cleaned<W: Write>(
    writer: W,
    rows: &[CleanedRow],
    rolling_window: NonZeroUsize,
) -> Result<(), IngestError> {
    let mut writer = Writer::from_writer(writer);

    let mut header: Vec<String> = Channel::RAW.iter().map(|c| c.name().to_string()).collect();
    header.push(LABEL_COLUMN.to_string());
    header.push(Channel::AccMagnitude.name().to_string());
    header.push(Channel::GyroMagnitude.name().to_string());
    header.push(format!("AccMagnitude_mean_{}", rolling_window));
    header.push(format!("GyroMagnitude_mean_{}", rolling_window));
    writer.write_record(&header)?;

    for row in rows {
        let mut record: Vec<String> = Channel::RAW
            .iter()
            .map(|&c| row.sample.channel(c).to_string())
            .collect();
        record.push(row.sample.label.to_string());
        record.push(row.acc_magnitude.to_string());
        record.push(row.gyro_magnitude.to_string());
        record.push(row.acc_magnitude_rolling.to_string());
        record.push(row.gyro_magnitude_rolling.to_string());
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| IngestError::Csv(e.into()))
}

/// Write the windowed feature table: the 16 features in schema order, then `Target`.
///
/// Returns the number of windows written.
pub fn write_features<W, I>(writer: W, windows: I) -> Result<usize, IngestError>
where
    W: Write,
    I: IntoIterator<Item = LabeledWindow>,
{
    let mut writer = Writer::from_writer(writer);

    let mut header: Vec<&str> = FEATURE_NAMES.to_vec();
    header.push(TARGET_COLUMN);
    writer.write_record(&header)?;

    let mut count = 0;
    for window in windows {
        let mut record: Vec<String> = window
            .features
            .as_slice()
            .iter()
            .map(f64::to_string)
            .collect();
        record.push(window.label.to_string());
        writer.write_record(&record)?;
        count += 1;
    }

    writer.flush().map_err(|e| IngestError::Csv(e.into()))?;
    Ok(count)
}

/// Inputs and outputs of one windowing run.
#[derive(Debug, Clone)]
pub struct WindowingJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Optional export of the cleaned rows
    pub cleaned_output: Option<PathBuf>,
    pub window_size: NonZeroUsize,
    pub rolling_window: NonZeroUsize,
}

/// Row and window counts of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowingReport {
    pub load: LoadReport,
    pub cleaned_rows: usize,
    pub windows: usize,
}

impl WindowingJob {
    /// Load, clean, window and export.
    pub fn run(&self) -> Result<WindowingReport, IngestError> {
        let (samples, load) = load_samples_csv(&self.input)?;
        tracing::info!(
            path = %self.input.display(),
            rows = load.rows_read,
            dropped = load.rows_dropped,
            "Loaded raw sensor data"
        );
        for summary in summarize(&samples) {
            tracing::info!(
                channel = %summary.channel,
                count = summary.count,
                mean = summary.mean,
                std = summary.std,
                min = summary.min,
                max = summary.max,
                "Channel summary"
            );
        }

        let rows = clean(&samples, self.rolling_window);
        if let Some(path) = &self.cleaned_output {
            write_cleaned(create_file(path)?, &rows, self.rolling_window)?;
            tracing::info!(path = %path.display(), rows = rows.len(), "Cleaned data saved");
        }

        let cleaned: Vec<SensorSample> = rows.iter().map(|r| r.sample).collect();
        let windows = write_features(
            create_file(&self.output)?,
            windowize(&cleaned, self.window_size),
        )?;
        tracing::info!(path = %self.output.display(), windows, "Windowed features saved");

        Ok(WindowingReport {
            load,
            cleaned_rows: rows.len(),
            windows,
        })
    }
}

fn create_file(path: &Path) -> Result<std::fs::File, IngestError> {
    let io_err = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::File::create(path).map_err(io_err)
}
