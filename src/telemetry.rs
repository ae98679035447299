//! Logging setup and standard spans.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG`, when set and valid, wins over the configured level. Calling
/// this twice is harmless; the second call is ignored.
pub fn init(config: &LogConfig) {
    let filter = build_filter(config);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Standardized span constructors for server observability.
pub mod spans {
    use std::net::SocketAddr;

    use tracing::{Span, info_span};

    use crate::state::ConnectionKey;

    /// Create a span for a client connection.
    pub fn connection(key: ConnectionKey, peer: &SocketAddr) -> Span {
        info_span!("connection", key = %key, peer = %peer)
    }

    /// Create a span for a listener.
    pub fn listener(addr: &SocketAddr) -> Span {
        info_span!("listener", addr = %addr)
    }
}
