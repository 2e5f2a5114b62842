//! Shared Cache Module
//!
//! Thread-safe cache handle: the entry store behind a single readers-writer
//! lock, plus the optional background sweeper tied to the cache's lifetime.
//!
//! Mutations (`set`, `delete`, `cleanup`, `flush`, `load`) take the exclusive
//! lock for their whole duration. Reads (`get`, `count`, `list`, `size`,
//! `stats`, `save`) take the shared lock. No guard outlives a call.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::mem::size_of;
use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::snapshot::{self, JsonCodec, SnapshotCodec};
use crate::cache::{CacheEntry, CacheStats, CacheStore, EstimateSize, KeyEntryPair};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweeper, SweeperHandle};

// == Cache ==
/// Concurrent in-memory cache with absolute per-entry expiry.
///
/// Expired entries stay visible to `get`, `count` and `list` until a sweep
/// removes them, either the background sweeper or an explicit `cleanup()`.
///
/// # Example
/// ```
/// use chrono::Duration;
/// use expiring_cache::Cache;
///
/// // A zero cadence disables background sweeping
/// let cache = Cache::new(Duration::zero());
/// cache.set("a", 1, Duration::seconds(-1));
/// cache.set("b", 2, Duration::seconds(60));
///
/// assert_eq!(cache.get("a"), Some(1));
/// cache.cleanup();
/// assert_eq!(cache.get("a"), None);
/// assert_eq!(cache.get("b"), Some(2));
/// ```
pub struct Cache<V> {
    /// Entry store guarded by the cache-wide lock
    store: Arc<RwLock<CacheStore<V>>>,
    /// Background sweeper, if a positive cadence was configured
    sweeper: Option<SweeperHandle>,
    /// TTL used by `set_default`
    default_ttl: Duration,
}

impl<V> Default for Cache<V> {
    /// A cache without background sweeping.
    fn default() -> Self {
        Self::build(CacheConfig::default().default_ttl())
    }
}

impl<V: Send + Sync + 'static> Cache<V> {
    // == Constructor ==
    /// Creates a new cache sweeping expired entries every `cleanup_interval`.
    ///
    /// # Arguments
    /// * `cleanup_interval` - Time between background sweeps. Zero or
    ///   negative disables the sweeper; expired entries are then only
    ///   removed by `cleanup()`.
    ///
    /// Inside a Tokio runtime the sweeper runs as a task on that runtime,
    /// otherwise on a dedicated thread. Either way it stops when the cache
    /// is dropped.
    pub fn new(cleanup_interval: Duration) -> Self {
        Self::with_default_ttl(cleanup_interval, CacheConfig::default().default_ttl())
    }

    /// Creates a new cache from a loaded configuration.
    ///
    /// Uses the configured cleanup interval (see [`Cache::new`]) and the
    /// configured default TTL for `set_default`.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_default_ttl(config.cleanup_interval(), config.default_ttl())
    }

    fn with_default_ttl(cleanup_interval: Duration, default_ttl: Duration) -> Self {
        let mut cache = Self::build(default_ttl);

        // Negative intervals fail the conversion
        if let Ok(interval) = cleanup_interval.to_std() {
            if !interval.is_zero() {
                cache.sweeper = Some(spawn_sweeper(Arc::downgrade(&cache.store), interval));
            }
        }

        cache
    }
}

impl<V> Cache<V> {
    fn build(default_ttl: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new())),
            sweeper: None,
            default_ttl,
        }
    }

    // == Set ==
    /// Inserts or replaces `key`, expiring `ttl` from now.
    ///
    /// # Arguments
    /// * `key` - Entry key; an existing entry is replaced wholesale
    /// * `value` - Value to store
    /// * `ttl` - Time to live, truncated to whole seconds. Any sign is
    ///   accepted; a non-positive TTL yields an entry that the next sweep
    ///   removes.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store.write().set(key.into(), value, ttl);
    }

    /// Inserts or replaces `key` with the configured default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    // == Delete ==
    /// Removes `key`, expired or not.
    ///
    /// # Returns
    /// * `Ok(())` - The entry was removed
    /// * `Err(CacheError::NotFound)` - The key is absent; nothing changed
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.write().delete(key)
    }

    /// Returns true if `key` is present, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.store.read().entry(key).is_some()
    }

    // == Count ==
    /// Number of entries held, expired or not.
    pub fn count(&self) -> usize {
        self.store.read().len()
    }

    /// Returns true if the cache holds no entries, expired or not.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    // == Cleanup ==
    /// Sweeps every entry whose expiry is at or before now.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        self.store.write().cleanup_expired()
    }

    // == Flush ==
    /// Removes every entry, expired or not.
    pub fn flush(&self) {
        self.store.write().flush();
    }

    // == Stats ==
    /// Returns a snapshot of entry counts and sweep counters.
    ///
    /// `expired_entries` counts entries already past their expiry that no
    /// sweep has removed yet.
    pub fn stats(&self) -> CacheStats {
        self.store.read().stats()
    }

    // == Sweeper Control ==
    /// Stops the background sweeper, if any. Idempotent.
    ///
    /// A sweep already in progress runs to completion.
    pub fn stop_sweeper(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }

    /// Returns true while a background sweeper is scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .as_ref()
            .is_some_and(|sweeper| !sweeper.is_stopped() && !sweeper.is_finished())
    }
}

impl<V: Clone> Cache<V> {
    // == Get ==
    /// Returns a copy of the value for `key`, expired or not.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.read().get(key)
    }

    /// Like [`Cache::get`], but signals absence with `CacheError::NotFound`.
    pub fn try_get(&self, key: &str) -> Result<V> {
        self.get(key)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    /// Returns a copy of the entry for `key`, including its expiry stamp.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.store.read().entry(key).cloned()
    }

    // == List ==
    /// Copies out every entry, expired or not, under a single lock acquisition.
    pub fn list(&self) -> Vec<KeyEntryPair<V>> {
        self.store.read().list()
    }
}

impl<V: EstimateSize> Cache<V> {
    // == Size ==
    /// Approximate footprint of keys, values and expiry stamps in bytes.
    ///
    /// Advisory only, see [`EstimateSize`].
    pub fn size(&self) -> usize {
        self.store
            .read()
            .iter()
            .map(|(key, entry)| {
                key.estimated_size() + entry.value().estimated_size() + size_of::<i64>()
            })
            .sum()
    }
}

impl<V: Serialize> Cache<V> {
    // == Save ==
    /// Writes a JSON snapshot of every entry to `sink`.
    ///
    /// The shared lock is held until the sink has been written and flushed,
    /// so writers wait for slow sinks but the dump is fully consistent.
    pub fn save<W: Write>(&self, sink: W) -> Result<()> {
        self.save_with(&JsonCodec::new(), sink)
    }

    /// Writes a snapshot using `codec`.
    ///
    /// # Arguments
    /// * `codec` - Byte encoding of the snapshot document
    /// * `sink` - Destination, flushed before returning
    ///
    /// # Returns
    /// * `Err(CacheError::Encoding)` - A value cannot be represented by the
    ///   codec; nothing has been written
    /// * `Err(CacheError::Io)` - The sink failed
    pub fn save_with<C: SnapshotCodec, W: Write>(&self, codec: &C, sink: W) -> Result<()> {
        let store = self.store.read();
        snapshot::write_snapshot(&store, codec, sink)
    }

    /// Writes a JSON snapshot to the file at `path`, creating or truncating it.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.save(BufWriter::new(file))
    }
}

impl<V: DeserializeOwned> Cache<V> {
    // == Load ==
    /// Replaces the whole cache with a JSON snapshot read from `source`.
    ///
    /// The source is decoded completely before the lock is taken; on any
    /// error the current contents are left untouched.
    pub fn load<R: Read>(&self, source: R) -> Result<()> {
        self.load_with(&JsonCodec::new(), source)
    }

    /// Replaces the whole cache with a snapshot decoded by `codec`.
    ///
    /// # Arguments
    /// * `codec` - Byte encoding of the snapshot document
    /// * `source` - Stream holding one complete snapshot
    ///
    /// # Returns
    /// * `Err(CacheError::Decoding)` - Malformed, truncated or mistyped data,
    ///   or an unsupported snapshot version
    /// * `Err(CacheError::Io)` - The source failed
    ///
    /// The cache is unchanged on error.
    pub fn load_with<C: SnapshotCodec, R: Read>(&self, codec: &C, source: R) -> Result<()> {
        let entries = snapshot::read_snapshot(codec, source)?;
        self.store.write().replace_all(entries);
        Ok(())
    }

    /// Replaces the whole cache with the JSON snapshot in the file at `path`.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path)?;
        self.load(BufReader::new(file))
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("entries", &self.count())
            .field("sweeping", &self.is_sweeping())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
