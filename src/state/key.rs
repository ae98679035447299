//! Connection identities.

use std::fmt;

use crate::config::MAX_LISTENERS;

/// Opaque identity of one accepted connection.
///
/// Keys come from a monotonically increasing counter, so a key is never
/// handed out twice during one reactor lifetime even when the kernel
/// recycles the underlying descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey(u64);

impl ConnectionKey {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// First key handed out. Values below it are reserved for listener tokens.
const KEY_COUNTER_START: u64 = MAX_LISTENERS as u64;

/// Hands out [`ConnectionKey`]s in increasing order.
#[derive(Debug)]
pub struct KeyGenerator {
    next: u64,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self {
            next: KEY_COUNTER_START,
        }
    }

    /// Generate the next unique key.
    pub fn next_key(&mut self) -> ConnectionKey {
        let key = ConnectionKey(self.next);
        self.next += 1;
        key
    }
}

/// Whether `raw` falls in the range reserved for listeners.
pub(crate) fn is_listener_slot(raw: usize) -> bool {
    (raw as u64) < KEY_COUNTER_START
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let mut generator = KeyGenerator::new();
        // Keys below MAX_LISTENERS belong to listeners
        assert_eq!(generator.next_key(), ConnectionKey::new(16));
        assert_eq!(generator.next_key(), ConnectionKey::new(17));
        assert_eq!(generator.next_key().get(), 18);
    }

    #[test]
    fn test_keys_never_repeat() {
        let mut generator = KeyGenerator::new();
        let mut last = generator.next_key();
        for _ in 0..1000 {
            let key = generator.next_key();
            assert!(key > last);
            assert!(!is_listener_slot(key.get() as usize));
            last = key;
        }
    }

    #[test]
    fn test_listener_slots() {
        assert!(is_listener_slot(0));
        assert!(is_listener_slot(MAX_LISTENERS - 1));
        assert!(!is_listener_slot(MAX_LISTENERS));
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionKey::new(42).to_string(), "#42");
    }
}
