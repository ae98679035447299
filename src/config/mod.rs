//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, RegistryConfig)
//! - [`listen`]: Bounded listener list and its validation (ListenConfig)
//! - [`defaults`]: serde default functions
//! - [`validation`]: whole-config checks run on load

pub mod defaults;
mod listen;
mod types;
pub mod validation;

pub use listen::{
    parse_port, ListenConfig, ListenerEntry, ListenerError, ListenerStatus, MAX_HOST_LEN,
    MAX_LISTENERS,
};
pub use types::{Config, ConfigError, LogConfig, ReactorConfig, RegistryConfig, ServerConfig};
