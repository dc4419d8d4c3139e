//! Core cache implementation with insertion-order eviction and lazy TTL

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use super::config::CacheConfig;
use super::stats::{CacheEvent, CacheStats, Counters};
use crate::resilience::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

#[derive(Debug)]
struct CacheStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    entries: HashMap<K, CacheEntry<V>>,
    /// Keys from oldest to newest insertion
    insertion_order: VecDeque<K>,
}

impl<K, V> CacheStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self { entries: HashMap::new(), insertion_order: VecDeque::new() }
    }

    fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.insertion_order.retain(|k| k != key);
        Some(entry)
    }
}

/// Generic thread-safe TTL cache
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`)
/// - `C`: Clock type for time-based operations (defaults to `SystemClock`)
///
/// # Example
/// ```
/// use gapfinder_common::cache::{Cache, CacheConfig};
///
/// let cache: Cache<String, i32> = Cache::new(CacheConfig::default());
/// cache.set("key".to_string(), 42);
/// assert_eq!(cache.get(&"key".to_string()), Some(42));
///
/// cache.invalidate(&"key".to_string());
/// assert!(cache.is_empty());
/// ```
pub struct Cache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    storage: Arc<RwLock<CacheStorage<K, V>>>,
    config: CacheConfig,
    counters: Arc<Counters>,
    clock: C,
}

impl<K, V> Cache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache with the given configuration using system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    /// Create a new cache with a custom clock (useful for testing)
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            storage: Arc::new(RwLock::new(CacheStorage::new())),
            config,
            counters: Arc::new(Counters::default()),
            clock,
        }
    }

    /// Get a value from the cache
    ///
    /// Returns `None` if the key doesn't exist or if the entry has reached
    /// its TTL. Expired entries are removed as a side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();

        {
            let storage = self.storage.read();
            match storage.entries.get(key) {
                None => {
                    self.counters.record(CacheEvent::Miss);
                    return None;
                }
                Some(entry) if now.duration_since(entry.stored_at) < self.config.ttl => {
                    self.counters.record(CacheEvent::Hit);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock since a writer may have
        // refreshed the entry in between.
        let mut storage = self.storage.write();
        let fresh = storage
            .entries
            .get(key)
            .filter(|entry| now.duration_since(entry.stored_at) < self.config.ttl)
            .map(|entry| entry.value.clone());
        if fresh.is_some() {
            self.counters.record(CacheEvent::Hit);
            return fresh;
        }

        if storage.remove(key).is_some() {
            self.counters.record(CacheEvent::Expiration);
        }
        self.counters.record(CacheEvent::Miss);
        None
    }

    /// Store a value, stamping it with the current time
    ///
    /// Overwriting an existing key refreshes its timestamp and moves it to the
    /// newest insertion slot. Adding a new key to a full cache first evicts the
    /// oldest-inserted entry.
    pub fn set(&self, key: K, value: V) {
        let mut storage = self.storage.write();

        if storage.remove(&key).is_none() {
            while storage.entries.len() >= self.config.max_size {
                let Some(oldest) = storage.insertion_order.pop_front() else {
                    break;
                };
                storage.entries.remove(&oldest);
                self.counters.record(CacheEvent::Eviction);
            }
        }

        let entry = CacheEntry { value, stored_at: self.clock.now() };
        storage.entries.insert(key.clone(), entry);
        storage.insertion_order.push_back(key);
        self.counters.record(CacheEvent::Insert);
    }

    /// Remove a single entry, returning its value if present
    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.storage.write().remove(key).map(|entry| entry.value)
    }

    /// Clear all entries and statistics
    pub fn clear(&self) {
        let mut storage = self.storage.write();
        storage.entries.clear();
        storage.insertion_order.clear();
        self.counters.reset();
    }

    /// Get the current number of entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.storage.read().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len(), self.config.max_size)
    }
}

impl<K, V, C> Clone for Cache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config.clone(),
            counters: Arc::clone(&self.counters),
            clock: self.clock.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::core.
    use std::time::Duration;

    use super::*;
    use crate::resilience::MockClock;

    fn mock_cache(max_size: usize, ttl: Duration) -> (Cache<String, i32, MockClock>, MockClock) {
        let clock = MockClock::new();
        let cache = Cache::with_clock(CacheConfig::new(max_size, ttl), clock.clone());
        (cache, clock)
    }

    fn key(name: &str) -> String {
        name.to_string()
    }

    /// Validates `Cache::set` and `Cache::get` for the basic store scenario.
    #[test]
    fn test_set_and_get() {
        let cache: Cache<String, i32> = Cache::new(CacheConfig::default());

        cache.set(key("a"), 1);
        cache.set(key("b"), 2);

        assert_eq!(cache.get(&key("a")), Some(1));
        assert_eq!(cache.get(&key("b")), Some(2));
        assert_eq!(cache.get(&key("c")), None);
        assert_eq!(cache.len(), 2);
    }

    /// Validates lazy TTL expiry.
    ///
    /// # Test Steps
    /// 1. Store an entry and advance the clock to just below the TTL
    /// 2. Confirm it is still served
    /// 3. Advance to exactly the TTL and confirm it is gone and removed
    #[test]
    fn test_entry_expires_at_ttl() {
        let (cache, clock) = mock_cache(10, Duration::from_secs(300));

        cache.set(key("a"), 1);
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get(&key("a")), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&key("a")), None);
        assert_eq!(cache.len(), 0);

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_expired_entry_stays_until_read() {
        let (cache, clock) = mock_cache(10, Duration::from_secs(1));

        cache.set(key("a"), 1);
        clock.advance(Duration::from_secs(5));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a")), None);
        assert_eq!(cache.len(), 0);
    }

    /// Validates insertion-order eviction when the bound is reached.
    #[test]
    fn test_full_cache_evicts_oldest_inserted() {
        let (cache, _clock) = mock_cache(3, Duration::from_secs(300));

        cache.set(key("a"), 1);
        cache.set(key("b"), 2);
        cache.set(key("c"), 3);
        cache.set(key("d"), 4);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&key("a")), None);
        assert_eq!(cache.get(&key("d")), Some(4));
        assert_eq!(cache.stats().evictions, 1);
    }

    /// Validates that reads do not protect an entry from eviction (this is
    /// not an LRU cache).
    #[test]
    fn test_reads_do_not_change_eviction_order() {
        let (cache, _clock) = mock_cache(2, Duration::from_secs(300));

        cache.set(key("a"), 1);
        cache.set(key("b"), 2);
        for _ in 0..5 {
            assert_eq!(cache.get(&key("a")), Some(1));
        }
        cache.set(key("c"), 3);

        assert_eq!(cache.get(&key("a")), None);
        assert_eq!(cache.get(&key("b")), Some(2));
        assert_eq!(cache.get(&key("c")), Some(3));
    }

    #[test]
    fn test_overwrite_refreshes_entry_without_eviction() {
        let (cache, clock) = mock_cache(2, Duration::from_secs(60));

        cache.set(key("a"), 1);
        cache.set(key("b"), 2);
        clock.advance(Duration::from_secs(50));
        cache.set(key("a"), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);

        // "b" is now the oldest insertion.
        cache.set(key("c"), 3);
        assert_eq!(cache.get(&key("b")), None);

        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.get(&key("a")), Some(10));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let (cache, _clock) = mock_cache(10, Duration::from_secs(60));

        cache.set(key("a"), 1);
        cache.set(key("b"), 2);

        assert_eq!(cache.invalidate(&key("a")), Some(1));
        assert_eq!(cache.invalidate(&key("a")), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats { max_size: 10, ..CacheStats::default() });
    }

    #[test]
    fn test_clones_share_storage() {
        let (cache, _clock) = mock_cache(10, Duration::from_secs(60));
        let clone = cache.clone();

        clone.set(key("shared"), 7);

        assert_eq!(cache.get(&key("shared")), Some(7));
        assert_eq!(cache.stats().inserts, 1);
    }
}
