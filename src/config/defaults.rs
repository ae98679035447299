//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "irc.localhost".to_string()
}

// =============================================================================
// Listener Defaults
// =============================================================================

/// Host bound when the daemon starts without a config file.
pub const DEFAULT_LISTEN_HOST: &str = "localhost";

/// Port bound when the daemon starts without a config file.
pub const DEFAULT_LISTEN_PORT: &str = "6667";

// =============================================================================
// Registry Defaults
// =============================================================================

pub fn default_initial_capacity() -> usize {
    4096
}

pub fn default_max_load_percent() -> u8 {
    75
}

// =============================================================================
// Reactor Defaults
// =============================================================================

/// Readiness events drained per poll call.
pub fn default_events_capacity() -> usize {
    32
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}
