//! State management module.
//!
//! Contains the keyed hash table and the per-connection records stored in it.

mod key;
mod siphash;
mod table;
mod user;

pub(crate) use key::is_listener_slot;
pub use key::{ConnectionKey, KeyGenerator};
pub use siphash::{SipHasher24, SipKey};
pub use table::{HashTable, TableError};
pub use user::User;
