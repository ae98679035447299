//! Network module.
//!
//! Contains the readiness [`Reactor`] that owns every socket.

mod reactor;

pub use reactor::{MAX_READS_PER_WAKEUP, READ_CHUNK, Reactor};
