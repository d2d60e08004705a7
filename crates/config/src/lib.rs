#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for taskmgr
//!
//! Values are resolved in this order, later sources winning:
//! - Default values (hard-coded)
//! - Configuration file (`~/.config/taskmgr/config.toml` or `--config`)
//! - Environment variables (`TASKMGR_*`)
//! - CLI flags (applied by the binary)

pub mod constants;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use taskmgr_errors::{ConfigError, Error};
use taskmgr_types::{GateName, StoreBackend, DEFAULT_GATE_NAME};
use tokio::fs;
use tracing::debug;

use constants::{
    DEFAULT_POLL_INTERVAL_MS, ENV_BACKEND, ENV_GATE_DIR, ENV_NAME, ENV_POLL_MS,
    FALLBACK_GATE_DIR_NAME, GATE_DIR_NAME,
};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gate store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Gate used when `-n` is not given
    #[serde(default = "default_gate_name")]
    pub default_name: String,
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory for the file backend (None = runtime dir)
    #[serde(default)]
    pub file_dir: Option<PathBuf>,
    /// How often the file backend re-checks an exhausted gate
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            default_name: default_gate_name(),
            backend: StoreBackend::default(),
            file_dir: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_gate_name() -> String {
    DEFAULT_GATE_NAME.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("taskmgr").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        debug!(path = %path.display(), "loaded config file");

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the default config file exists but cannot be
    /// read or parsed.
    pub async fn load() -> Result<Self, Error> {
        // No config directory (e.g. HOME unset) simply means no config file
        let Ok(config_path) = Self::default_path() else {
            return Ok(Self::default());
        };

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds a value that cannot
    /// be parsed into the expected type.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(name) = std::env::var(ENV_NAME) {
            self.gate.default_name = name;
        }

        if let Ok(backend) = std::env::var(ENV_BACKEND) {
            self.gate.backend = backend.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_BACKEND.to_string(),
                value: backend,
            })?;
        }

        if let Ok(dir) = std::env::var(ENV_GATE_DIR) {
            self.gate.file_dir = Some(PathBuf::from(dir));
        }

        if let Ok(poll) = std::env::var(ENV_POLL_MS) {
            let interval: u64 = poll.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_POLL_MS.to_string(),
                value: poll.clone(),
            })?;
            if interval == 0 {
                return Err(ConfigError::InvalidValue {
                    field: ENV_POLL_MS.to_string(),
                    value: poll,
                }
                .into());
            }
            self.gate.poll_interval_ms = interval;
        }

        Ok(())
    }

    /// Gate addressed when the command line names none
    #[must_use]
    pub fn default_gate(&self) -> GateName {
        GateName::new(self.gate.default_name.clone())
    }

    /// Directory holding file-backed gates (with default)
    #[must_use]
    pub fn gate_dir(&self) -> PathBuf {
        self.gate.file_dir.clone().unwrap_or_else(|| {
            dirs::runtime_dir().map_or_else(
                || std::env::temp_dir().join(FALLBACK_GATE_DIR_NAME),
                |dir| dir.join(GATE_DIR_NAME),
            )
        })
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.gate.poll_interval_ms.max(1))
    }
}
