//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;
use tracing_subscriber::filter::EnvFilter;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("at least one [[listen]] entry is required")]
    NoListeners,
    #[error("registry.initial_capacity must be a power of two, got {0}")]
    CapacityNotPowerOfTwo(usize),
    #[error("registry.max_load_percent must be between 1 and 100, got {0}")]
    LoadFactorOutOfRange(u8),
    #[error("reactor.events_capacity must be at least 1")]
    ZeroEventsCapacity,
    #[error("log.level is not a valid filter directive: '{0}'")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if config.listen.is_empty() {
        errors.push(ValidationError::NoListeners);
    }

    let registry = &config.registry;
    if !registry.initial_capacity.is_power_of_two() {
        errors.push(ValidationError::CapacityNotPowerOfTwo(
            registry.initial_capacity,
        ));
    }
    if !(1..=100).contains(&registry.max_load_percent) {
        errors.push(ValidationError::LoadFactorOutOfRange(
            registry.max_load_percent,
        ));
    }

    if config.reactor.events_capacity == 0 {
        errors.push(ValidationError::ZeroEventsCapacity);
    }

    if EnvFilter::try_new(&config.log.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.log.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
