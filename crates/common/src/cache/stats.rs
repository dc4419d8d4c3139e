//! Response cache counters

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a cache's counters
///
/// Counters start at zero when the cache is created and again after
/// [`Cache::clear`](super::Cache::clear).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held, expired ones included until read
    pub size: usize,
    pub max_size: usize,
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
    pub inserts: u64,
    /// Entries pushed out because the cache was full
    pub evictions: u64,
    /// Entries found stale on lookup and dropped
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 with no lookups
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} entries, {} hits / {} misses ({:.0}%), {} evicted, {} expired",
            self.size,
            self.max_size,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.expirations
        )
    }
}

/// Something the cache counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheEvent {
    Hit,
    Miss,
    Insert,
    Eviction,
    Expiration,
}

impl CacheEvent {
    const ALL: [CacheEvent; 5] = [
        CacheEvent::Hit,
        CacheEvent::Miss,
        CacheEvent::Insert,
        CacheEvent::Eviction,
        CacheEvent::Expiration,
    ];
}

/// Atomic counters, one per [`CacheEvent`], shared by every clone of a cache
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl Counters {
    fn counter(&self, event: CacheEvent) -> &AtomicU64 {
        match event {
            CacheEvent::Hit => &self.hits,
            CacheEvent::Miss => &self.misses,
            CacheEvent::Insert => &self.inserts,
            CacheEvent::Eviction => &self.evictions,
            CacheEvent::Expiration => &self.expirations,
        }
    }

    pub(crate) fn record(&self, event: CacheEvent) {
        self.counter(event).fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        for event in CacheEvent::ALL {
            self.counter(event).store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, size: usize, max_size: usize) -> CacheStats {
        let load = |event| self.counter(event).load(Ordering::Relaxed);
        CacheStats {
            size,
            max_size,
            hits: load(CacheEvent::Hit),
            misses: load(CacheEvent::Miss),
            inserts: load(CacheEvent::Insert),
            evictions: load(CacheEvent::Eviction),
            expirations: load(CacheEvent::Expiration),
        }
    }
}
