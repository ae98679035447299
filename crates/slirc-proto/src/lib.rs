//! # slirc-proto
//!
//! Wire-level building blocks for an IRC server that reads raw bytes off
//! non-blocking sockets.
//!
//! ## Features
//!
//! - Bounded, allocation-light parsing of a single IRC line into a [`Message`]
//! - Reassembly of CRLF-terminated lines from arbitrarily chunked reads
//!
//! ## Quick Start
//!
//! ```rust
//! use slirc_proto::{LineBuffer, Message};
//!
//! let mut buf = LineBuffer::new();
//! buf.extend(b"PRIVMSG #rust :Hello, ");
//! buf.extend(b"world!\r\nPING");
//!
//! let line = buf.next_line().unwrap().expect("one complete line");
//! let msg = Message::parse(&line);
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.params, ["#rust", "Hello, world!"]);
//!
//! // "PING" stays buffered until its terminator arrives.
//! assert!(buf.next_line().unwrap().is_none());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod line;
pub mod message;

pub use self::error::{ProtocolError, Result};
pub use self::line::{LineBuffer, MAX_IRC_LINE_LEN};
pub use self::message::{parse, Message, MAX_COMMAND_LEN, MAX_PARAMS, MAX_PARAM_LEN};
