//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A stored value cannot be represented by the snapshot codec
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Snapshot source is malformed, truncated or uses an unknown schema version
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// The snapshot sink or source failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CacheError {
    // == Is Not Found ==
    /// Returns true if this error signals an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
