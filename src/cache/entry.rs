//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with an absolute expiry.

use chrono::{Duration, Utc};

// == Cache Entry ==
/// Represents a single cache entry with its value and expiry stamp.
///
/// An entry is immutable once built: replacing a key creates a new entry
/// with a freshly computed expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    value: V,
    /// Expiration timestamp (Unix seconds)
    expires_at: i64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// The TTL is truncated to whole seconds. Zero or negative TTLs produce
    /// an entry that is already eligible for eviction.
    pub fn new(value: V, ttl: Duration) -> Self {
        let expires_at = current_timestamp().saturating_add(ttl.num_seconds());
        Self::with_expiry(value, expires_at)
    }

    /// Creates an entry with an explicit expiry stamp (used when restoring snapshots).
    pub fn with_expiry(value: V, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    /// Returns the stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the stored value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns the expiry stamp in Unix seconds.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current second is
    /// greater than or equal to its expiry stamp.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    /// Checks expiry against a caller-supplied Unix timestamp.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, `0` once expired.
    pub fn ttl_remaining(&self) -> i64 {
        self.expires_at.saturating_sub(current_timestamp()).max(0)
    }
}

// == Key Entry Pair ==
/// A key with a copy of its entry, as returned by `Cache::list`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEntryPair<V> {
    pub key: String,
    pub entry: CacheEntry<V>,
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_with_ttl() {
        let before = current_timestamp();
        let entry = CacheEntry::new("test_value".to_string(), Duration::seconds(60));

        assert_eq!(entry.value(), "test_value");
        assert!(entry.expires_at() >= before + 60);
        assert!(entry.expires_at() <= current_timestamp() + 60);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_zero_ttl_is_expired() {
        let entry = CacheEntry::new(1u32, Duration::zero());
        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), 0);
    }

    #[test]
    fn test_entry_negative_ttl_is_expired() {
        let entry = CacheEntry::new(1u32, Duration::seconds(-5));
        assert!(entry.is_expired());
        assert!(entry.expires_at() < current_timestamp());
    }

    #[test]
    fn test_sub_second_ttl_truncates() {
        let now = current_timestamp();
        let entry = CacheEntry::new((), Duration::milliseconds(900));
        // 900ms truncates to zero whole seconds
        assert!(entry.expires_at() <= now + 1);
        assert!(entry.expires_at() >= now);
    }

    #[test]
    fn test_ttl_remaining_seconds() {
        let entry = CacheEntry::new("test_value", Duration::seconds(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= 10);
        assert!(remaining >= 9);
    }

    #[test]
    fn test_ttl_remaining_extreme_stamps() {
        // Restored dumps may carry any i64 stamp
        assert_eq!(CacheEntry::with_expiry(1, i64::MIN).ttl_remaining(), 0);
        assert!(CacheEntry::with_expiry(1, i64::MAX).ttl_remaining() > 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::with_expiry("test", 1_000);

        assert!(!entry.is_expired_at(999));
        assert!(entry.is_expired_at(1_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(1_001));
    }

    #[test]
    fn test_into_value() {
        let entry = CacheEntry::with_expiry(vec![1, 2, 3], 0);
        assert_eq!(entry.into_value(), vec![1, 2, 3]);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new((), Duration::MAX);
        assert!(entry.expires_at() > current_timestamp());
    }
}
