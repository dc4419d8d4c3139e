//! Availability calculator
//!
//! Turns a flat list of events from any number of calendars into free slots
//! per date. The computation works on wall-clock times as the remote service
//! reported them and performs no I/O.
//!
//! Per target date:
//! 1. Events falling on the date become busy intervals (timed events expanded
//!    by the buffer), sorted by start.
//! 2. Each window for the date (the caller's preferred windows, or the core
//!    time window) is swept for gaps of at least the minimum duration.
//! 3. Gaps from all windows are merged into the date's slots.
//!
//! Target dates are the in-range dates named by preferred windows when any
//! window is given, otherwise every date in the requested range. A named date
//! whose windows are all unusable (end not after start) yields no slots.

mod busy;
mod gaps;
mod service;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use gapfinder_domain::{
    AvailabilityConfig, CalendarEvent, DateRange, DayResult, EmptyDayPolicy, EventSpan, FreeSlot,
    PreferredWindow,
};
use tracing::debug;

pub use busy::{busy_intervals_on, to_busy_interval};
pub use gaps::{merge_gaps, scan_window, Gap};
pub use service::{AvailabilityReport, AvailabilityService, CalendarFailure};

/// Parameters of one availability computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRules {
    /// Padding added on both sides of timed events
    pub buffer: TimeDelta,
    /// Shortest gap reported as a slot
    pub min_slot: TimeDelta,
    /// Core window start, in hours after midnight
    pub core_start_hour: u32,
    /// Core window end, in hours after midnight (24 means midnight)
    pub core_end_hour: u32,
    pub empty_day_policy: EmptyDayPolicy,
}

impl Default for AvailabilityRules {
    fn default() -> Self {
        Self::from(&AvailabilityConfig::default())
    }
}

impl From<&AvailabilityConfig> for AvailabilityRules {
    fn from(config: &AvailabilityConfig) -> Self {
        Self {
            buffer: TimeDelta::minutes(i64::from(config.buffer_minutes)),
            min_slot: TimeDelta::minutes(i64::from(config.min_slot_duration_minutes)),
            core_start_hour: config.core_time_start_hour,
            core_end_hour: config.core_time_end_hour,
            empty_day_policy: config.empty_day_policy,
        }
    }
}

impl AvailabilityRules {
    pub fn with_buffer_minutes(mut self, minutes: u32) -> Self {
        self.buffer = TimeDelta::minutes(i64::from(minutes));
        self
    }

    pub fn with_min_slot_minutes(mut self, minutes: u32) -> Self {
        self.min_slot = TimeDelta::minutes(i64::from(minutes));
        self
    }

    pub fn with_core_hours(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.core_start_hour = start_hour;
        self.core_end_hour = end_hour;
        self
    }

    pub fn with_empty_day_policy(mut self, policy: EmptyDayPolicy) -> Self {
        self.empty_day_policy = policy;
        self
    }

    fn core_window(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let midnight = date.and_time(NaiveTime::MIN);
        (
            midnight + TimeDelta::hours(i64::from(self.core_start_hour)),
            midnight + TimeDelta::hours(i64::from(self.core_end_hour)),
        )
    }
}

/// Compute free slots per date
///
/// Malformed events (missing or mismatched start/end) are skipped. Any
/// preferred window switches the computation to the dates those windows name;
/// dates outside `range` are dropped, and windows that do not end after they
/// start contribute no time. Dates without slots are omitted unless the rules
/// ask for empty rows on preferred dates.
pub fn compute_availability(
    events: &[CalendarEvent],
    range: DateRange,
    preferred: &[PreferredWindow],
    rules: &AvailabilityRules,
) -> Vec<DayResult> {
    let spans: Vec<EventSpan> = events.iter().filter_map(CalendarEvent::span).collect();
    if spans.len() < events.len() {
        debug!(skipped = events.len() - spans.len(), "skipping malformed events");
    }

    let mut windows_by_date: BTreeMap<NaiveDate, Vec<(NaiveDateTime, NaiveDateTime)>> =
        BTreeMap::new();
    for window in preferred.iter().filter(|w| range.contains(w.date)) {
        let windows = windows_by_date.entry(window.date).or_default();
        if window.is_valid() {
            windows.push((window.start(), window.end()));
        }
    }

    let target_dates: BTreeSet<NaiveDate> = if preferred.is_empty() {
        range.days().collect()
    } else {
        windows_by_date.keys().copied().collect()
    };

    let mut days = Vec::new();
    for date in target_dates {
        let busy = busy_intervals_on(&spans, date, rules.buffer);

        let windows = match windows_by_date.get(&date) {
            Some(windows) => windows.clone(),
            None => vec![rules.core_window(date)],
        };

        let candidates: Vec<Gap> = windows
            .iter()
            .flat_map(|(start, end)| scan_window(*start, *end, &busy, rules.min_slot))
            .collect();

        let slots: Vec<FreeSlot> = merge_gaps(candidates)
            .into_iter()
            .map(|(start, end)| FreeSlot::new(start.time(), end.time()))
            .collect();

        let report_empty = rules.empty_day_policy == EmptyDayPolicy::ReportPreferred
            && windows_by_date.contains_key(&date);
        if slots.is_empty() && !report_empty {
            continue;
        }

        days.push(DayResult::new(date, slots));
    }

    debug!(
        events = spans.len(),
        days_with_slots = days.iter().filter(|day| !day.is_empty()).count(),
        "availability computed"
    );
    days
}
