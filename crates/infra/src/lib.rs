//! # Gapfinder Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The request layer: resilient fetcher, response cache, scheduler and
//!   batch orchestrator
//! - The Google Calendar client implementing `CalendarSource`
//! - Configuration loading from files and environment variables
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `gapfinder-core`
//! - Builds on `gapfinder-common` resilience and cache primitives
//! - Contains all "impure" code (HTTP, file system, environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use http::{BatchOrchestrator, BatchRun, FetchRequest, RequestLayer, ResilientFetcher};
pub use integrations::calendar::{AccessTokenProvider, GoogleCalendarClient, StaticTokenProvider};
pub use observability::{init_tracing, LogFormat};
