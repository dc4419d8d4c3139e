//! Integration tests for the response cache
//!
//! Exercises the public cache API the way the request layer uses it: string
//! keys built from method, URL and body, JSON-like payloads, shared clones.

#![cfg(feature = "foundation")]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gapfinder_common::cache::{Cache, CacheConfig};
use gapfinder_common::resilience::MockClock;

fn request_key(method: &str, url: &str, body: &str) -> String {
    format!("{method}:{url}:{body}")
}

/// Validates that keys are matched exactly, with no normalization.
///
/// # Test Steps
/// 1. Store a response under one method+URL+body key
/// 2. Look up keys differing only in query order, method, or body
/// 3. Confirm only the identical key hits
#[test]
fn test_keys_match_exactly() {
    let cache: Cache<String, String> = Cache::new(CacheConfig::default());
    let url = "https://api.test/calendars?a=1&b=2";

    cache.set(request_key("GET", url, ""), "payload".to_string());

    assert_eq!(cache.get(&request_key("GET", url, "")), Some("payload".to_string()));
    assert_eq!(cache.get(&request_key("GET", "https://api.test/calendars?b=2&a=1", "")), None);
    assert_eq!(cache.get(&request_key("POST", url, "")), None);
    assert_eq!(cache.get(&request_key("GET", url, "{}")), None);
}

/// Validates that an entry read after TTL is absent even though size pressure
/// never evicted it, and that a new write refreshes it.
///
/// # Test Steps
/// 1. Store an entry in a large cache with a 5 minute TTL
/// 2. Advance the clock past the TTL and read it back
/// 3. Write it again and confirm it is served
#[test]
fn test_ttl_expiry_then_refresh() {
    let clock = MockClock::new();
    let cache: Cache<String, u32, MockClock> =
        Cache::with_clock(CacheConfig::with_ttl_minutes(1_000, 5), clock.clone());
    let key = request_key("GET", "https://api.test/events", "");

    cache.set(key.clone(), 1);
    clock.advance(Duration::from_secs(5 * 60 + 1));
    assert_eq!(cache.get(&key), None);

    cache.set(key.clone(), 2);
    assert_eq!(cache.get(&key), Some(2));
}

/// Validates the size bound across many writes.
#[test]
fn test_size_never_exceeds_bound() {
    let cache: Cache<String, usize> = Cache::new(CacheConfig::new(100, Duration::from_secs(60)));

    for i in 0..250 {
        cache.set(format!("key-{i}"), i);
        assert!(cache.len() <= 100);
    }

    // The most recent 100 survive.
    assert_eq!(cache.get(&"key-149".to_string()), None);
    assert_eq!(cache.get(&"key-150".to_string()), Some(150));
    assert_eq!(cache.get(&"key-249".to_string()), Some(249));
    assert_eq!(cache.stats().evictions, 150);
}

/// Validates concurrent writers and readers through shared clones.
#[test]
fn test_concurrent_access() {
    let cache = Arc::new(Cache::<String, usize>::new(CacheConfig::new(
        64,
        Duration::from_secs(60),
    )));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..200 {
                    let key = format!("t{t}-{i}");
                    cache.set(key.clone(), i);
                    let _ = cache.get(&key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= 64);
    assert_eq!(cache.stats().inserts, 8 * 200);
}
