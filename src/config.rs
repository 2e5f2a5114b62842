//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use chrono::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Background sweep interval in seconds, `<= 0` disables the sweeper
    pub cleanup_interval: i64,
    /// TTL in seconds applied by `Cache::set_default`
    pub default_ttl: i64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds, `<= 0` disables (default: 1)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            default_ttl: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.default_ttl),
        }
    }

    /// Sets the sweep interval in seconds.
    pub fn with_cleanup_interval(mut self, secs: i64) -> Self {
        self.cleanup_interval = secs;
        self
    }

    /// Sets the default TTL in seconds.
    pub fn with_default_ttl(mut self, secs: i64) -> Self {
        self.default_ttl = secs;
        self
    }

    /// Sweep interval as a signed duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::seconds(self.cleanup_interval)
    }

    /// Default TTL as a signed duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::seconds(self.default_ttl)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: 1,
            default_ttl: 300,
        }
    }
}
