//! Per-connection user record.

use std::net::SocketAddr;
use std::time::Instant;

use slirc_proto::{LineBuffer, Message};
use tracing::{debug, warn};

use super::ConnectionKey;

/// A connected user.
#[derive(Debug)]
pub struct User {
    pub key: ConnectionKey,
    /// Remote address of the connection.
    pub peer: SocketAddr,
    pub connected_at: Instant,
    /// Bytes of a line that has not been terminated yet.
    pub lines: LineBuffer,
    pub bytes_received: u64,
    pub lines_received: u64,
    /// Lines refused for exceeding the line limit.
    pub lines_dropped: u64,
    /// Command name of the most recent parsed line.
    pub last_command: Option<String>,
}

impl User {
    pub fn new(key: ConnectionKey, peer: SocketAddr) -> Self {
        Self {
            key,
            peer,
            connected_at: Instant::now(),
            lines: LineBuffer::new(),
            bytes_received: 0,
            lines_received: 0,
            lines_dropped: 0,
            last_command: None,
        }
    }

    /// Buffer `data` and parse every line it completes.
    ///
    /// Blank lines are skipped. Over-long lines are dropped with a warning;
    /// the connection keeps going.
    pub fn receive(&mut self, data: &[u8]) -> Vec<Message> {
        self.bytes_received += data.len() as u64;
        self.lines.extend(data);

        let mut messages = Vec::new();
        loop {
            match self.lines.next_line() {
                Ok(Some(line)) => {
                    let msg = slirc_proto::parse(&line);
                    if msg.is_empty() {
                        continue;
                    }
                    self.lines_received += 1;
                    self.last_command = Some(msg.command.clone());
                    debug!(key = %self.key, command = %msg.command, params = msg.params.len(), "Parsed line");
                    messages.push(msg);
                }
                Ok(None) => break,
                Err(e) => {
                    self.lines_dropped += 1;
                    warn!(key = %self.key, peer = %self.peer, code = e.error_code(), error = %e, "Dropping line");
                }
            }
        }
        messages
    }
}
