//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/formlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/formlens/` (~/.config/formlens/)
//! - State/Logs: `$XDG_STATE_HOME/formlens/` (~/.local/state/formlens/)

use crate::error::{Error, Result};
use crate::types::{Aggregation, TimeGranularity};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analysis defaults
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied when a call's options leave a setting out
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalysisConfig {
    /// Aggregation used when the options bag has none
    #[serde(default)]
    pub default_aggregation: Aggregation,

    /// Over-time bucket size used when the options bag has none
    #[serde(default)]
    pub default_granularity: TimeGranularity,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/formlens/config.toml` (~/.config/formlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("formlens").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/formlens/` (~/.local/state/formlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("formlens")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/formlens/formlens.log` (~/.local/state/formlens/formlens.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("formlens.log")
    }
}
