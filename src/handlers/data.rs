//! Inbound data handler.

use tracing::trace;

use crate::error::{HandlerError, HandlerResult};
use crate::event::Event;
use crate::server::ServerState;

/// Feed a chunk to its user's line buffer and parse every completed line.
///
/// Data for a key with no user is an error, which makes the reactor close
/// that connection.
pub fn on_data(state: &mut ServerState, event: &Event<'_>) -> HandlerResult {
    let Event::DataReceived { key, data } = *event else {
        return Ok(());
    };

    let user = state
        .users
        .get_mut(&key)
        .ok_or(HandlerError::UnknownConnection(key))?;

    for msg in user.receive(data) {
        trace!(%key, %msg, "Inbound message");
    }
    Ok(())
}
