//! Cache Statistics Module
//!
//! Tracks sweep activity and the current entry population.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache, expired or not
    pub total_entries: usize,
    /// Entries past their expiry that no sweep has removed yet
    pub expired_entries: usize,
    /// Number of sweeps run, manual or background
    pub sweeps: u64,
    /// Total entries removed by sweeps
    pub evicted: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Sweep ==
    /// Records one completed sweep and the entries it removed.
    pub fn record_sweep(&mut self, removed: usize) {
        self.sweeps += 1;
        self.evicted += removed as u64;
    }

    // == Live Entries ==
    /// Entries that have not reached their expiry.
    pub fn live_entries(&self) -> usize {
        self.total_entries.saturating_sub(self.expired_entries)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.sweeps, 0);
        assert_eq!(stats.evicted, 0);
    }

    #[test]
    fn test_record_sweep() {
        let mut stats = CacheStats::new();
        stats.record_sweep(3);
        stats.record_sweep(0);
        assert_eq!(stats.sweeps, 2);
        assert_eq!(stats.evicted, 3);
    }

    #[test]
    fn test_live_entries() {
        let stats = CacheStats {
            total_entries: 5,
            expired_entries: 2,
            ..CacheStats::default()
        };
        assert_eq!(stats.live_entries(), 3);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(CacheStats::new()).unwrap();
        assert_eq!(json["total_entries"], 0);
        assert_eq!(json["sweeps"], 0);
    }
}
