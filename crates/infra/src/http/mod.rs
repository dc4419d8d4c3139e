//! HTTP request layer
//!
//! - [`ResilientFetcher`]: one logical request with timeout, classification
//!   and bounded retry, honouring the shared rate-limit state
//! - [`BatchOrchestrator`]: many requests in paced, fault-isolated chunks
//! - [`RequestLayer`]: owns the cache, scheduler and both of the above

mod batch;
mod client;
mod layer;
mod request;

pub use batch::{BatchOrchestrator, BatchRun};
pub use client::{ResilientFetcher, ResilientFetcherBuilder};
pub use layer::{RequestLayer, ResponseCache};
pub use request::FetchRequest;
