//! Calendar service integration
//!
//! Provides the Google Calendar implementation of the core
//! [`CalendarSource`](gapfinder_core::CalendarSource) port. Token acquisition
//! stays outside this crate and is plugged in through
//! [`AccessTokenProvider`].

pub mod auth;
pub mod google;
pub mod types;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use google::GoogleCalendarClient;
pub use types::Page;
