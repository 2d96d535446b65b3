//! Configuration for the driver behavior service.

use crate::core::windowing::default_window_size;
use crate::ingest::ROLLING_WINDOW;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration for the pipeline and the prediction server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trained model artifact (classifier + feature schema)
    pub model_path: PathBuf,

    /// Directory for the daily prediction logs
    pub log_dir: PathBuf,

    /// Address the HTTP server binds to
    pub host: IpAddr,

    /// Port the HTTP server binds to (0 for random)
    pub port: u16,

    /// Samples per feature window
    pub window_size: NonZeroUsize,

    /// Rows in the trailing magnitude mean computed while cleaning
    pub rolling_window: NonZeroUsize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("driver-behavior-service");

        Self {
            model_path: data_dir.join("driver_behavior_model.json"),
            log_dir: data_dir.join("logs"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            window_size: default_window_size(),
            rolling_window: NonZeroUsize::new(ROLLING_WINDOW).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `config_path`, or defaults if it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_json::from_str(&content).map_err(ConfigError::Parse)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `config_path`.
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("driver-behavior-service")
            .join("config.json")
    }

    /// Ensure the log directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }

    /// Socket address for the HTTP server.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}
