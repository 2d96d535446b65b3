//! Append-only, day-partitioned prediction log.
//!
//! Every prediction is written as one JSON object per line to
//! `<dir>/predictions_<YYYY-MM-DD>.jsonl`. The day is the UTC calendar date
//! of the entry's own timestamp, so file partitioning and record timestamps
//! always agree.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// One audited prediction. Created once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    /// UTC time of the prediction, microsecond precision
    #[serde(with = "micros_rfc3339")]
    pub timestamp: DateTime<Utc>,
    /// The feature vector exactly as submitted
    pub features: Vec<f64>,
    pub predicted_class: i64,
    pub predicted_label: String,
}

impl PredictionLogEntry {
    /// Create an entry stamped with the current time.
    pub fn now(features: Vec<f64>, predicted_class: i64, predicted_label: impl Into<String>) -> Self {
        Self::at(Utc::now(), features, predicted_class, predicted_label)
    }

    /// Create an entry with an explicit timestamp, truncated to microseconds.
    pub fn at(
        timestamp: DateTime<Utc>,
        features: Vec<f64>,
        predicted_class: i64,
        predicted_label: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            features,
            predicted_class,
            predicted_label: predicted_label.into(),
        }
    }

    /// UTC calendar day used to pick the log file.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Prediction log errors.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("prediction log I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed record at {path:?} line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("prediction log writer lock poisoned")]
    Poisoned,
}

/// Writer for the day-partitioned prediction log.
///
/// Appends from concurrent requests are serialized by an internal lock and
/// each record is written with a single `write_all`, so lines never
/// interleave.
#[derive(Debug)]
pub struct PredictionLog {
    dir: PathBuf,
    writer: Mutex<()>,
}

impl PredictionLog {
    /// Open a log rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LogError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| LogError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            writer: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the records of a given UTC day.
    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("predictions_{}.jsonl", day.format("%Y-%m-%d")))
    }

    /// Append one entry to its day's file and return that file's path.
    pub fn append(&self, entry: &PredictionLogEntry) -> Result<PathBuf, LogError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let path = self.path_for(entry.day());
        let io_err = |source| LogError::Io {
            path: path.clone(),
            source,
        };

        let _guard = self.writer.lock().map_err(|_| LogError::Poisoned)?;
        // The directory may have been removed since startup.
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)?;

        Ok(path)
    }

    /// Stream-parse every record of a day. Missing files read as empty.
    pub fn read_day(&self, day: NaiveDate) -> Result<Vec<PredictionLogEntry>, LogError> {
        Self::read_file(self.path_for(day))
    }

    /// Stream-parse every record of one log file, such as the path returned
    /// by [`PredictionLog::append`]. Missing files read as empty.
    pub fn read_file(path: impl Into<PathBuf>) -> Result<Vec<PredictionLogEntry>, LogError> {
        let path = path.into();
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(LogError::Io { path, source }),
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| LogError::Io {
                path: path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|source| LogError::Parse {
                path: path.clone(),
                line: index + 1,
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Serde support for microsecond RFC 3339 timestamps.
mod micros_rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
