//! Generic building blocks shared across gapfinder crates.
//!
//! Nothing in here knows about calendars. The request layer in
//! `gapfinder-infra` composes these pieces into the resilient fetch path.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: clock abstraction, backoff/jitter, TTL response cache
//! - `runtime`: async infrastructure (concurrency scheduler, rate-limit
//!   tracker), logs through `tracing`

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod cache;
#[cfg(feature = "foundation")]
pub mod resilience;
