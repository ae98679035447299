//! Line reassembly for chunked socket reads.
//!
//! The reactor reads sockets in small fixed-size chunks, so a single IRC
//! line can arrive split across several reads, and one read can carry
//! several lines. [`LineBuffer`] accumulates raw bytes and hands back one
//! complete `\n`-terminated line at a time.

use bytes::BytesMut;

use crate::error::{self, ProtocolError};

/// Maximum length of a single IRC line, terminator included.
pub const MAX_IRC_LINE_LEN: usize = 512;

/// Per-connection buffer that yields complete lines.
///
/// By default, lines are limited to 512 bytes (IRC standard).
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Set after an over-long partial line is dropped; the rest of that line,
    /// up to and including its `\n`, is thrown away as it arrives.
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create an empty buffer with the standard 512-byte line limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_IRC_LINE_LEN)
    }

    /// Create an empty buffer with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_len),
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Take the next complete line, terminator included.
    ///
    /// Returns `Ok(None)` when no full line is buffered yet. A line (or a
    /// pending partial line) longer than the limit is discarded and reported
    /// as [`ProtocolError::MessageTooLong`]; later lines are unaffected.
    /// The error is reported once per line, however many reads it spans.
    pub fn next_line(&mut self) -> error::Result<Option<BytesMut>> {
        if self.discarding {
            match self.buf.iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    let _ = self.buf.split_to(offset + 1);
                    self.next_index = 0;
                    self.discarding = false;
                }
                None => {
                    self.buf.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
            }
        }

        // Look for newline starting from where we left off
        if let Some(offset) = self.buf[self.next_index..]
            .iter()
            .position(|b| *b == b'\n')
        {
            let line = self.buf.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            return Ok(Some(line));
        }

        // No complete line yet - remember where we stopped
        self.next_index = self.buf.len();

        if self.buf.len() > self.max_len {
            let actual = self.buf.len();
            self.clear();
            self.discarding = true;
            return Err(ProtocolError::MessageTooLong {
                actual,
                limit: self.max_len,
            });
        }

        Ok(None)
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop any buffered bytes and resume framing at the next byte.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_index = 0;
        self.discarding = false;
    }
}
