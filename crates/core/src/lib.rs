//! # Gapfinder Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The availability calculator (events in, free slots out)
//! - The calendar source port the request layer implements
//! - The availability service tying the two together
//!
//! ## Architecture Principles
//! - Only depends on `gapfinder-domain`
//! - No HTTP or file system code
//! - All external dependencies via traits

pub mod availability;
pub mod calendar_ports;

pub use availability::{
    compute_availability, AvailabilityReport, AvailabilityRules, AvailabilityService,
    CalendarFailure,
};
pub use calendar_ports::{CalendarFetch, CalendarSource};
