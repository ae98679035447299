//! Error types for the IRC protocol library.
//!
//! Parsing a line never fails: oversized commands and parameters are
//! truncated by policy. The only protocol-level failure is a client
//! streaming more bytes than a single IRC line may hold.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Message exceeded maximum allowed length.
    ///
    /// The offending bytes have already been discarded from the buffer
    /// that reported this error.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual message length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },
}

impl ProtocolError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MessageTooLong { .. } => "message_too_long",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_both_lengths() {
        let err = ProtocolError::MessageTooLong {
            actual: 600,
            limit: 512,
        };
        assert_eq!(err.to_string(), "message too long: 600 bytes (limit: 512)");
        assert_eq!(err.error_code(), "message_too_long");
    }
}
