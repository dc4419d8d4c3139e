//! Availability service - fetch across calendars, then compute

use std::collections::HashSet;
use std::sync::Arc;

use gapfinder_domain::{
    CalendarEvent, DateRange, DayResult, FetchError, PreferredWindow, Result, TimeRange,
};
use tracing::{info, instrument, warn};

use super::{compute_availability, AvailabilityRules};
use crate::calendar_ports::CalendarSource;

/// A calendar whose events could not be fetched
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarFailure {
    pub calendar_id: String,
    pub error: FetchError,
}

/// Free time found, plus the calendars left out of the computation
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityReport {
    pub days: Vec<DayResult>,
    pub failed_calendars: Vec<CalendarFailure>,
}

impl AvailabilityReport {
    /// Whether every calendar contributed to the result
    pub fn is_complete(&self) -> bool {
        self.failed_calendars.is_empty()
    }

    pub fn total_free_minutes(&self) -> i64 {
        self.days.iter().map(|day| day.total_minutes).sum()
    }
}

/// Availability service
pub struct AvailabilityService {
    source: Arc<dyn CalendarSource>,
    rules: AvailabilityRules,
}

impl AvailabilityService {
    /// Create a new availability service
    pub fn new(source: Arc<dyn CalendarSource>, rules: AvailabilityRules) -> Self {
        Self { source, rules }
    }

    pub fn rules(&self) -> &AvailabilityRules {
        &self.rules
    }

    /// Find free time across every calendar the user can see
    ///
    /// # Errors
    /// Fails when the calendar list cannot be fetched, or when every calendar
    /// fails (a result computed from no events would report all time as free).
    #[instrument(skip(self, preferred), fields(start = %range.start, end = %range.end))]
    pub async fn find_free_time(
        &self,
        range: DateRange,
        preferred: &[PreferredWindow],
    ) -> Result<AvailabilityReport> {
        let calendars = self.source.list_calendars().await?;
        let calendar_ids: Vec<String> = calendars.into_iter().map(|calendar| calendar.id).collect();
        self.find_free_time_in(&calendar_ids, range, preferred).await
    }

    /// Find free time across the given calendars only
    ///
    /// # Errors
    /// Fails when every calendar fails.
    #[instrument(skip(self, calendar_ids, preferred), fields(calendars = calendar_ids.len()))]
    pub async fn find_free_time_in(
        &self,
        calendar_ids: &[String],
        range: DateRange,
        preferred: &[PreferredWindow],
    ) -> Result<AvailabilityReport> {
        let fetches = self.source.fetch_events(calendar_ids, TimeRange::covering(&range)).await;

        let mut seen = HashSet::new();
        let mut events: Vec<CalendarEvent> = Vec::new();
        let mut failed_calendars = Vec::new();

        for fetch in fetches {
            match fetch.outcome {
                Ok(calendar_events) => {
                    events.extend(
                        calendar_events.into_iter().filter(|event| seen.insert(event.id.clone())),
                    );
                }
                Err(error) => {
                    warn!(
                        calendar_id = %fetch.calendar_id,
                        error = %error,
                        "calendar fetch failed"
                    );
                    let calendar_id = fetch.calendar_id;
                    failed_calendars.push(CalendarFailure { calendar_id, error });
                }
            }
        }

        let all_failed = !calendar_ids.is_empty() && failed_calendars.len() == calendar_ids.len();
        if let Some(first) = failed_calendars.first().filter(|_| all_failed) {
            return Err(first.error.clone().into());
        }

        let days = compute_availability(&events, range, preferred, &self.rules);

        info!(
            events = events.len(),
            days = days.len(),
            failed = failed_calendars.len(),
            "availability search complete"
        );

        Ok(AvailabilityReport { days, failed_calendars })
    }
}
