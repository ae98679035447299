//! Connection lifecycle handlers.
//!
//! Keep the user table in step with the reactor: one [`User`] per open
//! connection, created on connect and dropped on disconnect.

use tracing::{debug, info};

use crate::error::{HandlerError, HandlerResult};
use crate::event::Event;
use crate::server::ServerState;
use crate::state::User;

/// Register a fresh [`User`] for the new connection.
pub fn on_connected(state: &mut ServerState, event: &Event<'_>) -> HandlerResult {
    let Event::ClientConnected { key, peer } = *event else {
        return Ok(());
    };

    if state.users.contains_key(&key) {
        return Err(HandlerError::DuplicateConnection(key));
    }

    state.users.insert(key, User::new(key, peer))?;
    debug!(%key, %peer, users = state.users.len(), "User registered");
    Ok(())
}

/// Drop the user belonging to a closed connection.
pub fn on_disconnected(state: &mut ServerState, event: &Event<'_>) -> HandlerResult {
    let Event::ClientDisconnected { key, reason } = *event else {
        return Ok(());
    };

    match state.users.remove(&key) {
        Some(user) => {
            info!(
                %key,
                peer = %user.peer,
                %reason,
                lines = user.lines_received,
                bytes = user.bytes_received,
                secs = user.connected_at.elapsed().as_secs(),
                "User removed"
            );
        }
        // Connect handler refused it, so it never made it into the table.
        None => debug!(%key, %reason, "Disconnect for untracked connection"),
    }
    Ok(())
}
