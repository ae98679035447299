//! Typed publish/subscribe bus between the reactor and protocol handlers.
//!
//! The reactor only knows how to publish [`Event`]s; whatever should happen
//! on connect, data or disconnect is a subscriber. Subscribers receive the
//! shared state explicitly as `&mut S`, so the bus itself holds no state and
//! can be borrowed immutably while handlers mutate.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::trace;

use crate::error::HandlerResult;
use crate::state::ConnectionKey;

/// Maximum subscribers per event kind.
pub const MAX_SUBSCRIBERS: usize = 32;

/// The fixed event catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ClientConnected,
    DataReceived,
    ClientDisconnected,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::ClientConnected,
        EventKind::DataReceived,
        EventKind::ClientDisconnected,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::ClientConnected => 0,
            Self::DataReceived => 1,
            Self::ClientDisconnected => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientConnected => "client_connected",
            Self::DataReceived => "data_received",
            Self::ClientDisconnected => "client_disconnected",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a connection went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Peer closed its end.
    Closed,
    /// Reading the socket failed.
    ReadError(io::ErrorKind),
    /// A subscriber refused the connection or its data.
    Rejected(&'static str),
    /// Server shut the connection down.
    Shutdown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("connection closed"),
            Self::ReadError(kind) => write!(f, "read error: {kind}"),
            Self::Rejected(code) => write!(f, "rejected: {code}"),
            Self::Shutdown => f.write_str("server shutdown"),
        }
    }
}

/// Event payloads. `DataReceived` borrows the reactor's read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    ClientConnected {
        key: ConnectionKey,
        peer: SocketAddr,
    },
    DataReceived {
        key: ConnectionKey,
        data: &'a [u8],
    },
    ClientDisconnected {
        key: ConnectionKey,
        reason: DisconnectReason,
    },
}

impl Event<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ClientConnected { .. } => EventKind::ClientConnected,
            Self::DataReceived { .. } => EventKind::DataReceived,
            Self::ClientDisconnected { .. } => EventKind::ClientDisconnected,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        match *self {
            Self::ClientConnected { key, .. }
            | Self::DataReceived { key, .. }
            | Self::ClientDisconnected { key, .. } => key,
        }
    }
}

/// Event bus errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("cannot subscribe to {kind}: too many subscribers (max {max})")]
    TooManySubscribers { kind: EventKind, max: usize },
}

/// A subscriber callback.
pub type Handler<S> = Box<dyn Fn(&mut S, &Event<'_>) -> HandlerResult>;

/// Ordered subscriber lists, one per [`EventKind`].
pub struct EventBus<S> {
    subscribers: [Vec<Handler<S>>; 3],
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> EventBus<S> {
    pub fn new() -> Self {
        Self {
            subscribers: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Append a handler for `kind`. Subscribing the same logic twice runs it twice.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> Result<(), BusError>
    where
        F: Fn(&mut S, &Event<'_>) -> HandlerResult + 'static,
    {
        let list = &mut self.subscribers[kind.index()];
        if list.len() >= MAX_SUBSCRIBERS {
            return Err(BusError::TooManySubscribers {
                kind,
                max: MAX_SUBSCRIBERS,
            });
        }
        list.push(Box::new(handler));
        Ok(())
    }

    /// Deliver `event` to its subscribers in subscription order.
    ///
    /// The first handler error stops dispatch and is returned.
    pub fn publish(&self, state: &mut S, event: Event<'_>) -> HandlerResult {
        let kind = event.kind();
        let list = &self.subscribers[kind.index()];
        trace!(%kind, key = %event.key(), subscribers = list.len(), "Publishing event");

        for handler in list {
            handler(state, &event)?;
        }
        Ok(())
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers[kind.index()].len()
    }
}

impl<S> fmt::Debug for EventBus<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EventBus");
        for kind in EventKind::ALL {
            s.field(kind.as_str(), &self.subscriber_count(kind));
        }
        s.finish()
    }
}
