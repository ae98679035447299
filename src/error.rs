//! Unified error handling for slircd-lite.
//!
//! Each layer has its own `thiserror` enum with a static `error_code()` for
//! log labeling. Only `main` collapses them into `anyhow`.

use std::io;

use thiserror::Error;

use crate::event::BusError;
use crate::state::{ConnectionKey, TableError};

// ============================================================================
// Handler Errors (event subscribers)
// ============================================================================

/// Errors a subscriber can return. Any of them closes the affected connection.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("no user registered for connection {0}")]
    UnknownConnection(ConnectionKey),

    #[error("connection {0} registered twice")]
    DuplicateConnection(ConnectionKey),

    #[error("user table: {0}")]
    Table(#[from] TableError),
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownConnection(_) => "unknown_connection",
            Self::DuplicateConnection(_) => "duplicate_connection",
            Self::Table(_) => "table_error",
        }
    }
}

/// Result type for event handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Network Errors (reactor)
// ============================================================================

/// Reactor and listener errors.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to create poll instance: {0}")]
    PollCreate(#[source] io::Error),

    #[error("poll failed: {0}")]
    Poll(#[source] io::Error),

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("{host}:{port} resolved to no addresses")]
    NoAddresses { host: String, port: String },

    #[error("failed to bind {host}:{port}: {source}")]
    Bind {
        host: String,
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to register socket: {0}")]
    Register(#[source] io::Error),

    #[error("too many listeners (max {max})")]
    TooManyListeners { max: usize },

    #[error("no listener could be bound")]
    NoListeners,

    #[error("client table: {0}")]
    Table(#[from] TableError),
}

impl NetError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PollCreate(_) => "poll_create",
            Self::Poll(_) => "poll",
            Self::InvalidPort(_) => "invalid_port",
            Self::Resolve { .. } => "resolve",
            Self::NoAddresses { .. } => "no_addresses",
            Self::Bind { .. } => "bind",
            Self::Register(_) => "register",
            Self::TooManyListeners { .. } => "too_many_listeners",
            Self::NoListeners => "no_listeners",
            Self::Table(_) => "table_error",
        }
    }
}

// ============================================================================
// Server Errors (startup and wiring)
// ============================================================================

/// Errors while assembling or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Net(#[from] NetError),
}
