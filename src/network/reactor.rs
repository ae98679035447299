//! Single-threaded readiness reactor.
//!
//! One [`Reactor`] owns the `mio::Poll`, every listening socket and every
//! accepted stream. Each wakeup is demultiplexed by token:
//!
//! ```text
//! Token(0..16)   listener  -> accept until WouldBlock
//!                            - new ConnectionKey, register READABLE
//!                            - insert into client table
//!                            - publish ClientConnected
//! Token(16..)    client    -> read 512-byte chunks until WouldBlock
//!                            - publish DataReceived per chunk
//!                            - EOF / error / handler failure -> close
//! close                    -> remove from table, deregister, drop stream
//!                            - publish ClientDisconnected
//! ```
//!
//! A client gets at most [`MAX_READS_PER_WAKEUP`] reads per pass. If it still
//! has data, its token goes on a backlog that the next pass services after a
//! non-blocking poll, so one busy sender cannot starve the other sockets.

use std::io::{self, Read};
use std::mem;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, error, info, warn};

use crate::config::{self, ListenConfig, MAX_LISTENERS, RegistryConfig};
use crate::error::NetError;
use crate::event::{DisconnectReason, Event, EventBus};
use crate::state::{ConnectionKey, HashTable, KeyGenerator, is_listener_slot};
use crate::telemetry::spans;

/// Bytes read from a client per `read` call.
pub const READ_CHUNK: usize = 512;

/// Reads granted to one client before yielding to other sockets.
pub const MAX_READS_PER_WAKEUP: usize = 16;

struct Listener {
    socket: TcpListener,
    addr: SocketAddr,
}

struct Client {
    stream: TcpStream,
    peer: SocketAddr,
}

/// Readiness loop plus the sockets it watches.
pub struct Reactor {
    poll: Poll,
    events: Events,
    /// Tokens of the last wakeup, reused between polls.
    ready: Vec<Token>,
    /// Clients that hit the read cap with data still pending.
    backlog: Vec<Token>,
    listeners: Vec<Listener>,
    clients: HashTable<ConnectionKey, Client>,
    keys: KeyGenerator,
    read_buf: [u8; READ_CHUNK],
}

impl Reactor {
    /// Create a reactor handling up to `events_capacity` readiness events per poll.
    pub fn new(events_capacity: usize) -> Result<Self, NetError> {
        Self::with_registry(events_capacity, &RegistryConfig::default())
    }

    /// Like [`Reactor::new`], sizing the client table from `registry`.
    pub fn with_registry(
        events_capacity: usize,
        registry: &RegistryConfig,
    ) -> Result<Self, NetError> {
        let poll = Poll::new().map_err(NetError::PollCreate)?;
        let clients = HashTable::new(registry.initial_capacity, registry.max_load_percent)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(events_capacity),
            ready: Vec::with_capacity(events_capacity),
            backlog: Vec::new(),
            listeners: Vec::new(),
            clients,
            keys: KeyGenerator::new(),
            read_buf: [0; READ_CHUNK],
        })
    }

    /// Bind one listener, trying every address `host` resolves to.
    ///
    /// Returns the bound address (useful with port "0").
    pub fn listen(&mut self, host: &str, port: &str) -> Result<SocketAddr, NetError> {
        if self.listeners.len() >= MAX_LISTENERS {
            return Err(NetError::TooManyListeners { max: MAX_LISTENERS });
        }
        let port_num =
            config::parse_port(port).ok_or_else(|| NetError::InvalidPort(port.to_owned()))?;

        let candidates = (host, port_num)
            .to_socket_addrs()
            .map_err(|source| NetError::Resolve {
                host: host.to_owned(),
                port: port.to_owned(),
                source,
            })?;

        let mut last_err = None;
        for addr in candidates {
            let mut socket = match TcpListener::bind(addr) {
                Ok(socket) => socket,
                Err(e) => {
                    warn!(%host, %addr, error = %e, "Bind failed, trying next address");
                    last_err = Some(e);
                    continue;
                }
            };

            let token = Token(self.listeners.len());
            self.poll
                .registry()
                .register(&mut socket, token, Interest::READABLE)
                .map_err(NetError::Register)?;

            let bound = socket.local_addr().unwrap_or(addr);
            info!(%host, %port, addr = %bound, "Listening");
            self.listeners.push(Listener {
                socket,
                addr: bound,
            });
            return Ok(bound);
        }

        Err(match last_err {
            Some(source) => NetError::Bind {
                host: host.to_owned(),
                port: port.to_owned(),
                source,
            },
            None => NetError::NoAddresses {
                host: host.to_owned(),
                port: port.to_owned(),
            },
        })
    }

    /// Bind every configured listener. Failures are logged and skipped.
    ///
    /// Returns the number bound, or [`NetError::NoListeners`] if that is zero.
    pub fn bind_all(&mut self, listen: &ListenConfig) -> Result<usize, NetError> {
        for entry in listen.entries() {
            if let Err(e) = self.listen(&entry.host, &entry.port) {
                error!(host = %entry.host, port = %entry.port, code = e.error_code(), error = %e, "Failed to bind listener");
            }
        }

        if self.listeners.is_empty() {
            return Err(NetError::NoListeners);
        }
        Ok(self.listeners.len())
    }

    /// Wait for readiness once and dispatch everything that became ready.
    ///
    /// Returns the number of sockets serviced, backlogged clients included.
    /// An interrupted wait counts as zero. While the backlog is non-empty the
    /// wait does not block, whatever `timeout` says.
    pub fn poll_once<S>(
        &mut self,
        bus: &EventBus<S>,
        state: &mut S,
        timeout: Option<Duration>,
    ) -> Result<usize, NetError> {
        let timeout = if self.backlog.is_empty() {
            timeout
        } else {
            Some(Duration::ZERO)
        };
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(NetError::Poll(e)),
        }

        let mut ready = mem::take(&mut self.ready);
        ready.clear();
        ready.append(&mut self.backlog);
        for event in self.events.iter() {
            if !ready.contains(&event.token()) {
                ready.push(event.token());
            }
        }

        for &token in &ready {
            if is_listener_slot(token.0) {
                self.accept(token.0, bus, state);
            } else {
                self.read_client(ConnectionKey::new(token.0 as u64), bus, state);
            }
        }

        let handled = ready.len();
        self.ready = ready;
        Ok(handled)
    }

    /// Poll forever. Returns only when polling itself fails.
    pub fn run<S>(&mut self, bus: &EventBus<S>, state: &mut S) -> Result<(), NetError> {
        loop {
            self.poll_once(bus, state, None)?;
        }
    }

    /// Close every open connection with [`DisconnectReason::Shutdown`].
    pub fn shutdown<S>(&mut self, bus: &EventBus<S>, state: &mut S) {
        for (key, client) in self.clients.drain() {
            self.release(key, client, DisconnectReason::Shutdown, bus, state);
        }
    }

    /// Addresses of all bound listeners, in bind order.
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.listeners.iter().map(|l| l.addr).collect()
    }

    /// Number of open client connections.
    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }

    fn accept<S>(&mut self, idx: usize, bus: &EventBus<S>, state: &mut S) {
        let Some(addr) = self.listeners.get(idx).map(|l| l.addr) else {
            return;
        };
        let _span = spans::listener(&addr).entered();

        loop {
            let Some(listener) = self.listeners.get(idx) else {
                return;
            };

            let (mut stream, peer) = match listener.socket.accept() {
                Ok(pair) => pair,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Hard errors such as EMFILE end this round. Connections still
                // queued wait for the listener's next readiness instead of
                // spinning on a failing accept.
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    return;
                }
            };

            let key = self.keys.next_key();
            let _span = spans::connection(key, &peer).entered();

            if let Err(e) = self.poll.registry().register(
                &mut stream,
                Token(key.get() as usize),
                Interest::READABLE,
            ) {
                warn!(error = %e, "Failed to register connection");
                continue;
            }

            if let Err(e) = self.clients.insert(key, Client { stream, peer }) {
                // The stream was dropped with the failed insert, which closes it.
                error!(code = e.error_code(), error = %e, "Failed to track connection");
                continue;
            }

            info!("Client connected");
            if let Err(e) = bus.publish(state, Event::ClientConnected { key, peer }) {
                warn!(code = e.error_code(), error = %e, "Connection rejected by handler");
                self.close(key, DisconnectReason::Rejected(e.error_code()), bus, state);
            }
        }
    }

    fn read_client<S>(&mut self, key: ConnectionKey, bus: &EventBus<S>, state: &mut S) {
        let mut reads = 0;
        loop {
            // Spurious wakeups for already-closed keys are ignored.
            let Some(client) = self.clients.get_mut(&key) else {
                return;
            };
            if reads == MAX_READS_PER_WAKEUP {
                debug!(key = %key, "Read cap reached, deferring");
                self.backlog.push(Token(key.get() as usize));
                return;
            }

            match client.stream.read(&mut self.read_buf) {
                Ok(0) => {
                    self.close(key, DisconnectReason::Closed, bus, state);
                    return;
                }
                Ok(n) => {
                    reads += 1;
                    let data = &self.read_buf[..n];
                    if let Err(e) = bus.publish(state, Event::DataReceived { key, data }) {
                        warn!(key = %key, code = e.error_code(), error = %e, "Data rejected by handler");
                        self.close(key, DisconnectReason::Rejected(e.error_code()), bus, state);
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(key = %key, error = %e, "Read failed");
                    self.close(key, DisconnectReason::ReadError(e.kind()), bus, state);
                    return;
                }
            }
        }
    }

    fn close<S>(
        &mut self,
        key: ConnectionKey,
        reason: DisconnectReason,
        bus: &EventBus<S>,
        state: &mut S,
    ) {
        if let Some(client) = self.clients.remove(&key) {
            self.release(key, client, reason, bus, state);
        }
    }

    fn release<S>(
        &mut self,
        key: ConnectionKey,
        mut client: Client,
        reason: DisconnectReason,
        bus: &EventBus<S>,
        state: &mut S,
    ) {
        let _span = spans::connection(key, &client.peer).entered();

        if let Err(e) = self.poll.registry().deregister(&mut client.stream) {
            debug!(error = %e, "Deregister failed");
        }
        drop(client);

        info!(%reason, "Client disconnected");
        if let Err(e) = bus.publish(state, Event::ClientDisconnected { key, reason }) {
            warn!(code = e.error_code(), error = %e, "Disconnect handler failed");
        }
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("listeners", &self.local_addrs())
            .field("connections", &self.clients.len())
            .finish_non_exhaustive()
    }
}
