//! Keyed SipHash-2-4.
//!
//! [`SipKey`] holds the 128-bit secret and builds [`SipHasher24`] instances,
//! so any `K: Hash` can be placed in a [`HashTable`](super::HashTable)
//! without the placement being predictable from outside the process.

use rand::RngCore;
use rand::rngs::OsRng;
use std::hash::{BuildHasher, Hasher};

/// 128-bit SipHash key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SipKey {
    k0: u64,
    k1: u64,
}

impl SipKey {
    /// Build a key from 16 secret bytes (k0 = bytes 0..8, k1 = bytes 8..16, both little-endian).
    pub fn from_bytes(secret: [u8; 16]) -> Self {
        Self {
            k0: load_le(&secret[..8]),
            k1: load_le(&secret[8..]),
        }
    }

    /// Draw a fresh key from the operating system CSPRNG.
    pub fn random() -> Result<Self, rand::Error> {
        let mut secret = [0u8; 16];
        OsRng.try_fill_bytes(&mut secret)?;
        Ok(Self::from_bytes(secret))
    }
}

// Never print the secret.
impl std::fmt::Debug for SipKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SipKey(..)")
    }
}

impl BuildHasher for SipKey {
    type Hasher = SipHasher24;

    fn build_hasher(&self) -> SipHasher24 {
        SipHasher24::new_with_key(self)
    }
}

/// Streaming SipHash-2-4 state.
#[derive(Debug, Clone)]
pub struct SipHasher24 {
    v0: u64,
    v1: u64,
    v2: u64,
    v3: u64,
    /// Unprocessed bytes, little-endian packed.
    tail: u64,
    ntail: usize,
    length: usize,
}

impl SipHasher24 {
    pub fn new_with_key(key: &SipKey) -> Self {
        Self {
            v0: key.k0 ^ 0x736f_6d65_7073_6575,
            v1: key.k1 ^ 0x646f_7261_6e64_6f6d,
            v2: key.k0 ^ 0x6c79_6765_6e65_7261,
            v3: key.k1 ^ 0x7465_6462_7974_6573,
            tail: 0,
            ntail: 0,
            length: 0,
        }
    }

    #[inline]
    fn round(&mut self) {
        self.v0 = self.v0.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(13);
        self.v1 ^= self.v0;
        self.v0 = self.v0.rotate_left(32);
        self.v2 = self.v2.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(16);
        self.v3 ^= self.v2;
        self.v0 = self.v0.wrapping_add(self.v3);
        self.v3 = self.v3.rotate_left(21);
        self.v3 ^= self.v0;
        self.v2 = self.v2.wrapping_add(self.v1);
        self.v1 = self.v1.rotate_left(17);
        self.v1 ^= self.v2;
        self.v2 = self.v2.rotate_left(32);
    }

    #[inline]
    fn compress(&mut self, m: u64) {
        self.v3 ^= m;
        self.round();
        self.round();
        self.v0 ^= m;
    }
}

impl Hasher for SipHasher24 {
    fn write(&mut self, msg: &[u8]) {
        self.length = self.length.wrapping_add(msg.len());
        let mut rest = msg;

        if self.ntail != 0 {
            let needed = 8 - self.ntail;
            let fill = needed.min(rest.len());
            self.tail |= load_le(&rest[..fill]) << (8 * self.ntail);
            if fill < needed {
                self.ntail += fill;
                return;
            }
            let m = self.tail;
            self.compress(m);
            self.tail = 0;
            self.ntail = 0;
            rest = &rest[fill..];
        }

        let mut chunks = rest.chunks_exact(8);
        for chunk in &mut chunks {
            self.compress(load_le(chunk));
        }

        let remainder = chunks.remainder();
        self.tail = load_le(remainder);
        self.ntail = remainder.len();
    }

    fn finish(&self) -> u64 {
        let mut state = self.clone();
        let b = ((self.length as u64 & 0xff) << 56) | self.tail;

        state.compress(b);
        state.v2 ^= 0xff;
        state.round();
        state.round();
        state.round();
        state.round();

        state.v0 ^ state.v1 ^ state.v2 ^ state.v3
    }
}

/// Little-endian load of up to 8 bytes.
#[inline]
fn load_le(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
