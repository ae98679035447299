//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::*;
use super::listen::ListenConfig;
use super::validation::{self, ValidationError};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Server configuration.
///
/// Every section is optional in TOML and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity.
    #[serde(default)]
    pub server: ServerConfig,
    /// Listeners, bound in order.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Connection registry sizing.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Readiness loop sizing.
    #[serde(default)]
    pub reactor: ReactorConfig,
    /// Log filtering.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        validation::validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "irc.straylight.net").
    #[serde(default = "default_server_name")]
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

/// Sizing of the hash table that tracks connected users.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Initial slot count. Must be a power of two.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    /// Load percentage (1-100) at which the table doubles.
    #[serde(default = "default_max_load_percent")]
    pub max_load_percent: u8,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            max_load_percent: default_max_load_percent(),
        }
    }
}

/// Readiness loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactorConfig {
    /// Maximum readiness events handled per poll.
    #[serde(default = "default_events_capacity")]
    pub events_capacity: usize,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            events_capacity: default_events_capacity(),
        }
    }
}

/// Logging configuration.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "slircd_lite=debug".
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
