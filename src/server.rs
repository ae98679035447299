//! Server context: configuration, event bus, user state and reactor.
//!
//! The three parts are separate fields so the reactor can borrow the bus
//! immutably while handlers mutate the state.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::info;

use crate::config::{Config, RegistryConfig};
use crate::error::ServerError;
use crate::event::EventBus;
use crate::handlers;
use crate::network::Reactor;
use crate::state::{ConnectionKey, HashTable, TableError, User};

/// State shared with event handlers.
#[derive(Debug)]
pub struct ServerState {
    /// Connected users, keyed by connection.
    pub users: HashTable<ConnectionKey, User>,
}

impl ServerState {
    pub fn new(registry: &RegistryConfig) -> Result<Self, TableError> {
        Ok(Self {
            users: HashTable::new(registry.initial_capacity, registry.max_load_percent)?,
        })
    }
}

/// A running IRC server.
#[derive(Debug)]
pub struct Server {
    config: Config,
    bus: EventBus<ServerState>,
    state: ServerState,
    reactor: Reactor,
}

impl Server {
    /// Build the server and subscribe the standard handlers. Nothing is bound yet.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let state = ServerState::new(&config.registry)?;

        let mut bus = EventBus::new();
        handlers::register(&mut bus)?;

        let reactor = Reactor::with_registry(config.reactor.events_capacity, &config.registry)?;

        Ok(Self {
            config,
            bus,
            state,
            reactor,
        })
    }

    /// Bind every configured listener and return their addresses.
    pub fn bind(&mut self) -> Result<Vec<SocketAddr>, ServerError> {
        self.reactor.bind_all(&self.config.listen)?;
        Ok(self.reactor.local_addrs())
    }

    /// Run the event loop until polling fails.
    pub fn run(&mut self) -> Result<(), ServerError> {
        info!(
            name = %self.config.server.name,
            listeners = self.reactor.local_addrs().len(),
            "Server running"
        );
        self.reactor.run(&self.bus, &mut self.state)?;
        Ok(())
    }

    /// One reactor iteration.
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<usize, ServerError> {
        Ok(self.reactor.poll_once(&self.bus, &mut self.state, timeout)?)
    }

    /// Close all connections.
    pub fn shutdown(&mut self) {
        self.reactor.shutdown(&self.bus, &mut self.state);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }
}
