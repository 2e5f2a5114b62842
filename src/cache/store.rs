//! Cache Store Module
//!
//! Unsynchronized key/entry mapping with expiry sweeping. `Cache` wraps it
//! in a readers-writer lock.

use std::collections::HashMap;

use chrono::Duration;

use crate::cache::entry::current_timestamp;
use crate::cache::{CacheEntry, CacheStats, KeyEntryPair};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Key/entry storage with expiry sweeping.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Sweep counters
    stats: CacheStats,
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new empty CacheStore.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    // == Set ==
    /// Stores a key-value pair expiring `ttl` from now.
    ///
    /// If the key already exists, both the value and the expiry are replaced.
    pub fn set(&mut self, key: String, value: V, ttl: Duration) {
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    // == Get Entry ==
    /// Returns the entry for `key`, expired or not.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Delete ==
    /// Removes an entry by key, whether expired or not.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        match self.entries.remove(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Cleanup Expired ==
    /// Removes all entries expired at the current second.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(current_timestamp())
    }

    /// Removes all entries whose expiry is at or before `now`.
    pub fn cleanup_expired_at(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        self.stats.record_sweep(removed);
        removed
    }

    // == Flush ==
    /// Removes every entry, expired or not.
    pub fn flush(&mut self) {
        self.entries.clear();
    }

    // == Replace All ==
    /// Swaps in a complete new mapping, discarding the current one.
    pub fn replace_all(&mut self, entries: HashMap<String, CacheEntry<V>>) {
        self.entries = entries;
    }

    // == Iterate ==
    /// Iterates over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry<V>)> {
        self.entries.iter()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = current_timestamp();
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.expired_entries = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();
        stats
    }

    // == Length ==
    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Retrieves a copy of the value for `key`.
    ///
    /// Expiry is not checked here: stale entries stay visible until swept.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    // == List ==
    /// Copies every entry out into key/entry pairs.
    pub fn list(&self) -> Vec<KeyEntryPair<V>> {
        self.entries
            .iter()
            .map(|(key, entry)| KeyEntryPair {
                key: key.clone(),
                entry: entry.clone(),
            })
            .collect()
    }
}
