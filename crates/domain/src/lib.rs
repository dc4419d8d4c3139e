//! # Gapfinder Domain
//!
//! Domain types shared by every gapfinder crate.
//!
//! This crate contains:
//! - Calendar data as the remote service returns it (events, calendars)
//! - Availability types (busy intervals, preferred windows, free slots)
//! - Error taxonomy and the crate-wide `Result` alias
//! - Configuration structures and their defaults
//!
//! ## Architecture
//! - No dependencies on other gapfinder crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
