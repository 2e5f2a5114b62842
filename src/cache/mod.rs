//! Cache Module
//!
//! Provides in-memory caching with absolute expiry, lazy sweeping,
//! snapshots and size estimation.

mod entry;
mod representable;
mod shared;
mod size;
mod stats;
mod store;

pub mod snapshot;


// Re-export public types
pub use entry::{current_timestamp, CacheEntry, KeyEntryPair};
pub use shared::Cache;
pub use size::EstimateSize;
pub use snapshot::{JsonCodec, SnapshotCodec};
pub use stats::CacheStats;
pub use store::CacheStore;
