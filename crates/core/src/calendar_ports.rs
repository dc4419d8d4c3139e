//! Calendar source port
//!
//! Implemented by the request layer. A source lists the user's calendars and
//! fetches events for many calendars at once, reporting each calendar's
//! outcome separately so one failure does not hide the others.

use async_trait::async_trait;
use gapfinder_domain::{CalendarEvent, CalendarSummary, FetchError, Result, TimeRange};

/// Outcome of fetching one calendar's events
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarFetch {
    pub calendar_id: String,
    pub outcome: std::result::Result<Vec<CalendarEvent>, FetchError>,
}

impl CalendarFetch {
    pub fn success(calendar_id: impl Into<String>, events: Vec<CalendarEvent>) -> Self {
        Self { calendar_id: calendar_id.into(), outcome: Ok(events) }
    }

    pub fn failure(calendar_id: impl Into<String>, error: FetchError) -> Self {
        Self { calendar_id: calendar_id.into(), outcome: Err(error) }
    }
}

/// Trait for calendar provider operations
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// List every calendar the user can see
    async fn list_calendars(&self) -> Result<Vec<CalendarSummary>>;

    /// Fetch events overlapping `range` from each calendar
    ///
    /// Returns one entry per requested calendar, in request order.
    async fn fetch_events(&self, calendar_ids: &[String], range: TimeRange) -> Vec<CalendarFetch>;
}
