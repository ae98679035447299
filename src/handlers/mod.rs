//! Event subscribers.
//!
//! This module holds the standard handlers the server installs on its
//! [`EventBus`] and the [`register`] function that wires them up.

mod data;
mod lifecycle;

pub use data::on_data;
pub use lifecycle::{on_connected, on_disconnected};

use crate::event::{BusError, EventBus, EventKind};
use crate::server::ServerState;

/// Subscribe the standard handlers, one per event kind.
pub fn register(bus: &mut EventBus<ServerState>) -> Result<(), BusError> {
    bus.subscribe(EventKind::ClientConnected, on_connected)?;
    bus.subscribe(EventKind::DataReceived, on_data)?;
    bus.subscribe(EventKind::ClientDisconnected, on_disconnected)?;
    Ok(())
}
