//! Cache sizing and expiry settings

use std::time::Duration;

/// Default entry bound
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default time-to-live (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Configuration for cache behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries held at once
    pub max_size: usize,

    /// Age at which an entry stops being served
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_size: DEFAULT_MAX_ENTRIES, ttl: DEFAULT_TTL }
    }
}

impl CacheConfig {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self { max_size, ttl }
    }

    /// Convenience constructor taking the TTL in whole minutes
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use gapfinder_common::cache::CacheConfig;
    ///
    /// let config = CacheConfig::with_ttl_minutes(50, 10);
    /// assert_eq!(config.ttl, Duration::from_secs(600));
    /// ```
    pub fn with_ttl_minutes(max_size: usize, minutes: u64) -> Self {
        Self::new(max_size, Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size == 0 {
            return Err("cache max_size must be greater than 0".to_string());
        }
        if self.ttl.is_zero() {
            return Err("cache ttl must be greater than 0".to_string());
        }
        Ok(())
    }
}
