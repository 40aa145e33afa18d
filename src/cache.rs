use std::cell::Cell;

use crate::utils::SlotHash;

struct Entry<K, V> {
    key: K,
    value: V,
}

/// Direct-mapped computed table: each key hashes to exactly one slot,
/// and a newer entry simply evicts the older one.
pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        let bitmask = (size - 1) as u64;

        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Get the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    /// Get the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }
    /// Get the number of slots.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    fn index(&self, hash: u64) -> usize {
        (hash & self.bitmask) as usize
    }
}

impl<K, V> Cache<K, V>
where
    K: SlotHash + Eq,
{
    /// Get the cached result.
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.index(key.slot_hash());
        match &self.data[index] {
            Some(entry) if &entry.key == key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Insert a result into the cache.
    pub fn insert(&mut self, key: K, value: V) {
        let index = self.index(key.slot_hash());
        self.data[index] = Some(Entry { key, value });
    }
}
