//! slircd-lite - single-threaded IRC server core.
//!
//! A readiness [`network::Reactor`] accepts and reads sockets and publishes
//! typed [`event::Event`]s on an [`event::EventBus`]. The standard
//! [`handlers`] keep one [`state::User`] per connection in a robin-hood
//! [`state::HashTable`] keyed with SipHash-2-4, and parse every complete line
//! with `slirc_proto`. [`server::Server`] wires the pieces together.

pub mod config;
pub mod error;
pub mod event;
pub mod handlers;
pub mod network;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use error::{HandlerError, HandlerResult, NetError, ServerError};
pub use server::{Server, ServerState};
