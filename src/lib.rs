//! Expiring Cache - A process-local in-memory cache
//!
//! Every entry carries an absolute expiry. Stale entries are removed by a
//! background sweeper or an explicit `cleanup()`, never by reads. The whole
//! cache can be dumped to and restored from any byte stream.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    Cache, CacheEntry, CacheStats, EstimateSize, JsonCodec, KeyEntryPair, SnapshotCodec,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{spawn_sweeper, SweeperHandle};
