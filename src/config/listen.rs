//! Network listener configuration.

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

/// Maximum number of listeners a server may bind.
pub const MAX_LISTENERS: usize = 16;

/// Maximum length of a listener host (longest DNS name).
pub const MAX_HOST_LEN: usize = 253;

/// A single host/port pair to listen on.
///
/// Both halves are kept as strings so that hostnames resolve at bind time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenerEntry {
    /// IPv4/IPv6 literal or DNS name (e.g., "localhost").
    pub host: String,
    /// Decimal port number (e.g., "6667").
    pub port: String,
}

impl ListenerEntry {
    /// Create an entry without validating it.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }
}

/// Numeric result of a listener setter, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ListenerStatus {
    Ok = 0,
    InvalidPortRange = 1,
    TooManyListeners = 2,
    InvalidHost = 3,
}

/// Reasons a listener was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("unable to add \"{host}:{port}\" as a listener - port not valid, valid values are integers between 0 and 65535")]
    InvalidPortRange { host: String, port: String },

    #[error("unable to add \"{host}:{port}\" as a listener - too many listeners (max {max})")]
    TooManyListeners { host: String, port: String, max: usize },

    #[error("unable to add \"{host}\" as a listener - host must be 1 to {max} bytes")]
    InvalidHost { host: String, max: usize },
}

impl ListenerError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPortRange { .. } => "invalid_port_range",
            Self::TooManyListeners { .. } => "too_many_listeners",
            Self::InvalidHost { .. } => "invalid_host",
        }
    }

    /// Numeric status for callers that want a plain code.
    pub fn status(&self) -> ListenerStatus {
        match self {
            Self::InvalidPortRange { .. } => ListenerStatus::InvalidPortRange,
            Self::TooManyListeners { .. } => ListenerStatus::TooManyListeners,
            Self::InvalidHost { .. } => ListenerStatus::InvalidHost,
        }
    }

    pub fn status_code(&self) -> u8 {
        self.status() as u8
    }
}

/// Parse a port made of ASCII decimal digits only, within 0..=65535.
///
/// Signs, whitespace and the empty string are rejected.
pub fn parse_port(port: &str) -> Option<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse().ok()
}

/// Ordered, bounded list of validated listeners.
///
/// Deserializes from a TOML array of tables, running every entry through
/// [`ListenConfig::add_listener`]:
///
/// ```toml
/// [[listen]]
/// host = "0.0.0.0"
/// port = "6667"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<ListenerEntry>")]
pub struct ListenConfig {
    entries: Vec<ListenerEntry>,
}

impl ListenConfig {
    /// Create an empty listener list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a listener.
    ///
    /// The listener count is checked before the port, so a 17th entry is
    /// refused as [`ListenerError::TooManyListeners`] whatever its port.
    pub fn add_listener(&mut self, host: &str, port: &str) -> Result<(), ListenerError> {
        if self.entries.len() >= MAX_LISTENERS {
            let err = ListenerError::TooManyListeners {
                host: host.to_owned(),
                port: port.to_owned(),
                max: MAX_LISTENERS,
            };
            error!(code = err.error_code(), "{err}");
            return Err(err);
        }

        if host.is_empty() || host.len() > MAX_HOST_LEN {
            let err = ListenerError::InvalidHost {
                host: host.to_owned(),
                max: MAX_HOST_LEN,
            };
            error!(code = err.error_code(), "{err}");
            return Err(err);
        }

        if parse_port(port).is_none() {
            let err = ListenerError::InvalidPortRange {
                host: host.to_owned(),
                port: port.to_owned(),
            };
            error!(code = err.error_code(), "{err}");
            return Err(err);
        }

        self.entries.push(ListenerEntry::new(host, port));
        info!(%host, %port, "Added listener");
        Ok(())
    }

    /// Listeners in insertion order.
    pub fn entries(&self) -> &[ListenerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<ListenerEntry>> for ListenConfig {
    type Error = ListenerError;

    fn try_from(raw: Vec<ListenerEntry>) -> Result<Self, Self::Error> {
        let mut config = Self::new();
        for entry in &raw {
            config.add_listener(&entry.host, &entry.port)?;
        }
        Ok(config)
    }
}
