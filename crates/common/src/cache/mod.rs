//! Size-bounded TTL cache for idempotent responses
//!
//! Entries expire lazily: an expired entry is only dropped when a `get` finds
//! it. When the cache is full, inserting a new key evicts the single oldest
//! *inserted* entry. Reads never change eviction order.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use gapfinder_common::cache::{Cache, CacheConfig};
//!
//! let cache: Cache<String, i32> =
//!     Cache::new(CacheConfig::new(100, Duration::from_secs(300)));
//! cache.set("GET https://example.test/items".to_string(), 42);
//! assert_eq!(cache.get(&"GET https://example.test/items".to_string()), Some(42));
//! ```
//!
//! The cache is cheap to clone; clones share entries and statistics:
//!
//! ```
//! use std::thread;
//!
//! use gapfinder_common::cache::{Cache, CacheConfig};
//!
//! let cache: Cache<String, usize> = Cache::new(CacheConfig::default());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|i| {
//!         let cache = cache.clone();
//!         thread::spawn(move || cache.set(format!("key-{i}"), i))
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(cache.len(), 4);
//! ```

mod config;
mod core;
mod stats;

pub use core::Cache;

pub use config::{CacheConfig, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
pub use stats::CacheStats;
