//! Configuration management for Faultwatch
//!
//! Values are layered: serde defaults, then an optional TOML file, then
//! `FAULTWATCH__<SECTION>__<KEY>` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment prefix for configuration overrides
pub const ENV_PREFIX: &str = "FAULTWATCH";

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API configuration
    pub api: ApiConfig,

    /// TUI configuration
    pub tui: TuiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `config.toml` in the
    /// platform config directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder =
                        builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Self>()?;

        Ok(config)
    }
}

/// Platform config file location, e.g. `~/.config/faultwatch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "faultwatch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Backend API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend
    pub base_url: String,
    /// Route prefix the fault-management endpoints are mounted under
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            prefix: "/fault_management".to_string(),
        }
    }
}

/// TUI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick rate in milliseconds
    pub tick_rate_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 250 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
    /// Directory for log files while the TUI owns the terminal
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    /// Log directory, falling back to the platform data directory
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "faultwatch").map_or_else(
                || std::env::temp_dir().join("faultwatch"),
                |dirs| dirs.data_local_dir().join("logs"),
            )
        })
    }
}
