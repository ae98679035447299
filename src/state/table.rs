//! Open-addressing hash table with robin-hood probing.
//!
//! Keys are hashed with keyed SipHash-2-4 ([`SipKey`]), so bucket placement
//! cannot be steered by remote peers. Entries carry their probe sequence
//! length (PSL); on insert a carried entry that has travelled further than
//! the incumbent takes its slot. Removal shifts the following run back by one
//! instead of leaving tombstones, so lookups never scan dead slots.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::mem;

use thiserror::Error;
use tracing::debug;

use super::siphash::SipKey;

/// Errors from table construction and growth.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("capacity must be a non-zero power of two, got {0}")]
    InvalidCapacity(usize),
    #[error("max load percent must be between 1 and 100, got {0}")]
    InvalidLoadFactor(u8),
    #[error("failed to draw hash secret: {0}")]
    Entropy(#[from] rand::Error),
    #[error("capacity overflow growing past {0} slots")]
    CapacityOverflow(usize),
    #[error("failed to allocate {0} slots")]
    AllocationFailed(usize),
}

impl TableError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCapacity(_) => "invalid_capacity",
            Self::InvalidLoadFactor(_) => "invalid_load_factor",
            Self::Entropy(_) => "entropy",
            Self::CapacityOverflow(_) => "capacity_overflow",
            Self::AllocationFailed(_) => "allocation_failed",
        }
    }
}

struct Bucket<K, V> {
    hash: u64,
    /// Distance from the home slot.
    psl: usize,
    key: K,
    value: V,
}

/// Robin-hood hash map from `K` to `V`.
///
/// Capacity is always a power of two and only ever grows. An insert that
/// would bring the load to `max_load_percent` doubles the table first.
pub struct HashTable<K, V> {
    slots: Vec<Option<Bucket<K, V>>>,
    len: usize,
    max_load_percent: u8,
    hasher: SipKey,
}

impl<K: Hash + Eq, V> HashTable<K, V> {
    /// Create a table with a secret drawn from the OS CSPRNG.
    pub fn new(capacity: usize, max_load_percent: u8) -> Result<Self, TableError> {
        validate(capacity, max_load_percent)?;
        let hasher = SipKey::random()?;
        Self::build(capacity, max_load_percent, hasher)
    }

    /// Create a table with a fixed secret. Placement is deterministic.
    pub fn with_secret(
        capacity: usize,
        max_load_percent: u8,
        secret: [u8; 16],
    ) -> Result<Self, TableError> {
        validate(capacity, max_load_percent)?;
        Self::build(capacity, max_load_percent, SipKey::from_bytes(secret))
    }

    fn build(capacity: usize, max_load_percent: u8, hasher: SipKey) -> Result<Self, TableError> {
        Ok(Self {
            slots: alloc_slots(capacity)?,
            len: 0,
            max_load_percent,
            hasher,
        })
    }

    /// Insert or replace.
    ///
    /// Returns the previous value when `key` was present. On error the table
    /// is left exactly as it was.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let hash = self.hasher.hash_one(&key);

        if let Some(idx) = self.find_index(hash, &key)
            && let Some(bucket) = self.slots[idx].as_mut()
        {
            return Ok(Some(mem::replace(&mut bucket.value, value)));
        }

        if self.needs_growth() {
            self.grow()?;
        }

        self.place(Bucket {
            hash,
            psl: 0,
            key,
            value,
        });
        self.len += 1;
        Ok(None)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.find_index(self.hasher.hash_one(key), key)?;
        self.slots[idx].as_ref().map(|b| &b.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.find_index(self.hasher.hash_one(key), key)?;
        self.slots[idx].as_mut().map(|b| &mut b.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(self.hasher.hash_one(key), key).is_some()
    }

    /// Remove `key`, shifting the rest of its probe run back one slot.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut idx = self.find_index(self.hasher.hash_one(key), key)?;
        let removed = self.slots[idx].take()?;
        self.len -= 1;

        let mask = self.mask();
        loop {
            let next = (idx + 1) & mask;
            match self.slots[next].take() {
                Some(mut bucket) if bucket.psl > 0 => {
                    bucket.psl -= 1;
                    self.slots[idx] = Some(bucket);
                    idx = next;
                }
                other => {
                    self.slots[next] = other;
                    break;
                }
            }
        }

        Some(removed.value)
    }

    fn find_index<Q>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mask = self.mask();
        let mut idx = hash as usize & mask;

        for dist in 0..self.slots.len() {
            match &self.slots[idx] {
                None => return None,
                Some(bucket) if bucket.psl < dist => return None,
                Some(bucket) if bucket.hash == hash && <K as Borrow<Q>>::borrow(&bucket.key) == key => {
                    return Some(idx);
                }
                Some(_) => {}
            }
            idx = (idx + 1) & mask;
        }
        None
    }

    /// Robin-hood placement. Requires at least one free slot.
    fn place(&mut self, mut carried: Bucket<K, V>) {
        let mask = self.mask();
        let mut idx = carried.hash as usize & mask;
        carried.psl = 0;

        loop {
            match self.slots[idx].as_mut() {
                None => {
                    self.slots[idx] = Some(carried);
                    return;
                }
                Some(incumbent) => {
                    if carried.psl > incumbent.psl {
                        mem::swap(incumbent, &mut carried);
                    }
                }
            }
            idx = (idx + 1) & mask;
            carried.psl += 1;
        }
    }

    fn needs_growth(&self) -> bool {
        let wanted = (self.len as u128 + 1) * 100;
        wanted >= self.slots.len() as u128 * u128::from(self.max_load_percent)
    }

    fn grow(&mut self) -> Result<(), TableError> {
        let old_capacity = self.slots.len();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(TableError::CapacityOverflow(old_capacity))?;
        let new_slots = alloc_slots(new_capacity)?;

        let old = mem::replace(&mut self.slots, new_slots);
        for bucket in old.into_iter().flatten() {
            self.place(bucket);
        }

        debug!(
            from = old_capacity,
            to = new_capacity,
            len = self.len,
            "Hash table grown"
        );
        Ok(())
    }
}

impl<K, V> HashTable<K, V> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, always a power of two.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn max_load_percent(&self) -> u8 {
        self.max_load_percent
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|b| (&b.key, &b.value)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.as_mut().map(|b| &mut b.value))
    }

    /// Remove every entry, keeping the current capacity.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        self.len = 0;
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.take().map(|b| (b.key, b.value)))
            .collect()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }
}

impl<K, V> fmt::Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("max_load_percent", &self.max_load_percent)
            .finish_non_exhaustive()
    }
}

fn validate(capacity: usize, max_load_percent: u8) -> Result<(), TableError> {
    if !capacity.is_power_of_two() {
        return Err(TableError::InvalidCapacity(capacity));
    }
    if !(1..=100).contains(&max_load_percent) {
        return Err(TableError::InvalidLoadFactor(max_load_percent));
    }
    Ok(())
}

fn alloc_slots<K, V>(capacity: usize) -> Result<Vec<Option<Bucket<K, V>>>, TableError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| TableError::AllocationFailed(capacity))?;
    slots.resize_with(capacity, || None);
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: [u8; 16] = *b"0123456789abcdef";

    fn table<K: Hash + Eq, V>(capacity: usize, load: u8) -> HashTable<K, V> {
        HashTable::with_secret(capacity, load, SECRET).unwrap()
    }

    /// Every entry sits `psl` slots past its home and runs never jump by more than one.
    fn assert_invariants<K, V>(t: &HashTable<K, V>) {
        assert!(t.capacity().is_power_of_two());
        let mask = t.mask();
        let mut count = 0;

        for (i, slot) in t.slots.iter().enumerate() {
            let Some(bucket) = slot else { continue };
            count += 1;
            let home = bucket.hash as usize & mask;
            assert_eq!(i.wrapping_sub(home) & mask, bucket.psl, "slot {i}");

            if let Some(next) = &t.slots[(i + 1) & mask] {
                assert!(next.psl <= bucket.psl + 1, "robin-hood order broken at {i}");
            }
        }

        assert_eq!(count, t.len());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            HashTable::<u64, ()>::new(0, 75),
            Err(TableError::InvalidCapacity(0))
        ));
        assert!(matches!(
            HashTable::<u64, ()>::new(3000, 75),
            Err(TableError::InvalidCapacity(3000))
        ));
        assert!(matches!(
            HashTable::<u64, ()>::new(16, 0),
            Err(TableError::InvalidLoadFactor(0))
        ));
        assert!(matches!(
            HashTable::<u64, ()>::new(16, 101),
            Err(TableError::InvalidLoadFactor(101))
        ));
    }

    #[test]
    fn test_new_table_is_empty() {
        let t: HashTable<u64, u64> = HashTable::new(4096, 75).unwrap();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.capacity(), 4096);
        assert_eq!(t.max_load_percent(), 75);
        assert_eq!(t.get(&1), None);
    }

    #[test]
    fn test_insert_get_replace() {
        let mut t = table(16, 75);
        assert_eq!(t.insert(7u64, "seven").unwrap(), None);
        assert_eq!(t.get(&7), Some(&"seven"));
        assert!(t.contains_key(&7));

        assert_eq!(t.insert(7, "SEVEN").unwrap(), Some("seven"));
        assert_eq!(t.get(&7), Some(&"SEVEN"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_get_mut() {
        let mut t = table(16, 75);
        t.insert(1u64, 10u32).unwrap();
        *t.get_mut(&1).unwrap() += 5;
        assert_eq!(t.get(&1), Some(&15));
        assert!(t.get_mut(&2).is_none());
    }

    #[test]
    fn test_borrowed_lookup() {
        let mut t: HashTable<String, u32> = table(16, 75);
        t.insert("alice".to_string(), 1).unwrap();
        assert_eq!(t.get("alice"), Some(&1));
        assert_eq!(t.remove("alice"), Some(1));
        assert!(!t.contains_key("alice"));
    }

    #[test]
    fn test_growth_boundary() {
        let mut t = table(2048, 75);
        for i in 0..1535u64 {
            t.insert(i, i).unwrap();
        }
        assert_eq!(t.capacity(), 2048);

        t.insert(1535, 1535).unwrap();
        assert_eq!(t.capacity(), 4096);
        assert_eq!(t.len(), 1536);
        assert_invariants(&t);
    }

    #[test]
    fn test_replace_does_not_grow() {
        let mut t = table(4, 75);
        t.insert(1u64, 1).unwrap();
        t.insert(2u64, 2).unwrap();
        assert_eq!(t.capacity(), 4);
        t.insert(2u64, 20).unwrap();
        assert_eq!(t.capacity(), 4);
    }

    #[test]
    fn test_growth_keeps_all_entries() {
        let mut t = table(1, 100);
        for i in 0..10_000u64 {
            t.insert(i, i * 2).unwrap();
            assert!(t.len() < t.capacity());
        }
        assert!(t.capacity().is_power_of_two());
        for i in 0..10_000u64 {
            assert_eq!(t.get(&i), Some(&(i * 2)));
        }
        assert_invariants(&t);
    }

    #[test]
    fn test_load_stays_below_limit() {
        let mut t = table(8, 50);
        for i in 0..1000u64 {
            t.insert(i, ()).unwrap();
            assert!(t.len() * 100 < t.capacity() * 50, "len {} cap {}", t.len(), t.capacity());
        }
    }

    #[test]
    fn test_remove_backward_shift() {
        let mut t = table(64, 90);
        for i in 0..50u64 {
            t.insert(i, i).unwrap();
        }
        for i in (0..50u64).step_by(2) {
            assert_eq!(t.remove(&i), Some(i));
            assert_invariants(&t);
        }

        assert_eq!(t.len(), 25);
        for i in 0..50u64 {
            assert_eq!(t.get(&i).is_some(), i % 2 == 1, "key {i}");
        }
    }

    #[test]
    fn test_remove_missing_and_no_shrink() {
        let mut t = table(8, 75);
        assert_eq!(t.remove(&42u64), None);

        for i in 0..100u64 {
            t.insert(i, ()).unwrap();
        }
        let capacity = t.capacity();
        for i in 0..100u64 {
            t.remove(&i);
        }
        assert!(t.is_empty());
        assert_eq!(t.capacity(), capacity);
        assert_eq!(t.remove(&0), None);
    }

    #[test]
    fn test_iter_and_values_mut() {
        let mut t = table(16, 75);
        for i in 0..5u64 {
            t.insert(i, i).unwrap();
        }
        for v in t.values_mut() {
            *v *= 10;
        }

        let mut pairs: Vec<_> = t.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 0), (1, 10), (2, 20), (3, 30), (4, 40)]);

        let mut keys: Vec<_> = t.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_drain() {
        let mut t = table(16, 75);
        for i in 0..6u64 {
            t.insert(i, i).unwrap();
        }
        let drained = t.drain();
        assert_eq!(drained.len(), 6);
        assert!(t.is_empty());
        assert_eq!(t.iter().count(), 0);
        assert_eq!(t.capacity(), 16);
        t.insert(1, 1).unwrap();
        assert_eq!(t.get(&1), Some(&1));
    }

    #[test]
    fn test_matches_std_hashmap() {
        let mut t = table(4, 75);
        let mut model = HashMap::new();

        // Deterministic pseudo-random op stream.
        let mut x: u64 = 0x9e37_79b9_7f4a_7c15;
        for _ in 0..20_000 {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            let key = x % 512;

            if x % 3 == 0 {
                assert_eq!(t.remove(&key), model.remove(&key));
            } else {
                assert_eq!(t.insert(key, x).unwrap(), model.insert(key, x));
            }
            assert_eq!(t.len(), model.len());
        }

        assert_invariants(&t);
        for (k, v) in &model {
            assert_eq!(t.get(k), Some(v));
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TableError::InvalidCapacity(3).error_code(), "invalid_capacity");
        assert_eq!(TableError::CapacityOverflow(8).error_code(), "capacity_overflow");
    }
}
