use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gapfinder_core::{CalendarFetch, CalendarSource};
use gapfinder_domain::{
    CalendarEvent, CalendarSummary, FetchError, GapfinderError, Result as DomainResult, TimeRange,
};

/// In-memory mock for `CalendarSource`.
///
/// Each calendar either returns a fixed event list or a fixed error. Requested
/// ranges are recorded so tests can assert on listing bounds.
#[derive(Default, Clone)]
pub struct MockCalendarSource {
    calendars: Vec<CalendarSummary>,
    outcomes: HashMap<String, Result<Vec<CalendarEvent>, FetchError>>,
    list_error: Option<String>,
    requested_ranges: Arc<Mutex<Vec<TimeRange>>>,
}

impl MockCalendarSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a calendar that returns the given events.
    pub fn with_calendar(mut self, id: &str, events: Vec<CalendarEvent>) -> Self {
        self.calendars.push(summary(id));
        self.outcomes.insert(id.to_string(), Ok(events));
        self
    }

    /// Add a calendar whose fetch fails.
    pub fn with_failing_calendar(mut self, id: &str, error: FetchError) -> Self {
        self.calendars.push(summary(id));
        self.outcomes.insert(id.to_string(), Err(error));
        self
    }

    /// Make `list_calendars` fail.
    pub fn with_list_error(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn requested_ranges(&self) -> Vec<TimeRange> {
        self.requested_ranges.lock().unwrap().clone()
    }
}

fn summary(id: &str) -> CalendarSummary {
    CalendarSummary {
        id: id.to_string(),
        summary: id.to_string(),
        primary: false,
        access_role: None,
    }
}

#[async_trait]
impl CalendarSource for MockCalendarSource {
    async fn list_calendars(&self) -> DomainResult<Vec<CalendarSummary>> {
        match &self.list_error {
            Some(message) => Err(GapfinderError::Internal(message.clone())),
            None => Ok(self.calendars.clone()),
        }
    }

    async fn fetch_events(&self, calendar_ids: &[String], range: TimeRange) -> Vec<CalendarFetch> {
        self.requested_ranges.lock().unwrap().push(range);
        calendar_ids
            .iter()
            .map(|id| match self.outcomes.get(id) {
                Some(Ok(events)) => CalendarFetch::success(id.clone(), events.clone()),
                Some(Err(error)) => CalendarFetch::failure(id.clone(), error.clone()),
                None => CalendarFetch::failure(
                    id.clone(),
                    FetchError::Http { status: 404, message: "Not Found".to_string() },
                ),
            })
            .collect()
    }
}
