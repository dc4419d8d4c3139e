//! Calendar data in the shape the remote service returns it

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::availability::DateRange;

/// Start or end of an event as sent on the wire
///
/// Exactly one of the two fields is expected: `dateTime` for timed events,
/// `date` for all-day events. Both missing makes the event malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Resolved form of an [`EventTime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedOrAllDay {
    /// Wall-clock instant in the event's own offset
    Timed(NaiveDateTime),
    /// Calendar date of an all-day event
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn timed(date_time: DateTime<FixedOffset>) -> Self {
        Self { date_time: Some(date_time), date: None }
    }

    pub fn all_day(date: NaiveDate) -> Self {
        Self { date_time: None, date: Some(date) }
    }

    /// Prefer the timed form when both are present.
    pub fn resolve(&self) -> Option<TimedOrAllDay> {
        match (self.date_time, self.date) {
            (Some(date_time), _) => Some(TimedOrAllDay::Timed(date_time.naive_local())),
            (None, Some(date)) => Some(TimedOrAllDay::AllDay(date)),
            (None, None) => None,
        }
    }
}

/// One event from a calendar's event listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
}

/// Event span after resolving both ends to the same kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSpan {
    Timed { start: NaiveDateTime, end: NaiveDateTime },
    /// `end_exclusive` follows the remote convention: the day after the last
    /// covered date.
    AllDay { start: NaiveDate, end_exclusive: NaiveDate },
}

impl CalendarEvent {
    pub fn timed(
        id: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            summary: String::new(),
            start: Some(EventTime::timed(start)),
            end: Some(EventTime::timed(end)),
        }
    }

    pub fn all_day(id: impl Into<String>, start: NaiveDate, end_exclusive: NaiveDate) -> Self {
        Self {
            id: id.into(),
            summary: String::new(),
            start: Some(EventTime::all_day(start)),
            end: Some(EventTime::all_day(end_exclusive)),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Resolve start and end into a usable span
    ///
    /// Returns `None` for malformed events: a missing end, mixed timed and
    /// all-day ends, or an all-day event whose end is not after its start.
    /// A timed end before its start is clamped to a zero-length span.
    pub fn span(&self) -> Option<EventSpan> {
        let start = self.start.as_ref()?.resolve()?;
        let end = self.end.as_ref()?.resolve()?;

        match (start, end) {
            (TimedOrAllDay::Timed(start), TimedOrAllDay::Timed(end)) => {
                Some(EventSpan::Timed { start, end: end.max(start) })
            }
            (TimedOrAllDay::AllDay(start), TimedOrAllDay::AllDay(end_exclusive))
                if end_exclusive > start =>
            {
                Some(EventSpan::AllDay { start, end_exclusive })
            }
            _ => None,
        }
    }
}

impl EventSpan {
    /// Whether this span belongs to the given date for availability purposes
    ///
    /// Timed events belong to the date of their start; all-day events to every
    /// date they cover.
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        match *self {
            EventSpan::Timed { start, .. } => start.date() == date,
            EventSpan::AllDay { start, end_exclusive } => start <= date && date < end_exclusive,
        }
    }
}

/// Entry of the user's calendar list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<String>,
}

/// Instant range passed to the remote event listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Listing bounds for a date range
    ///
    /// Availability works on each event's own wall-clock date, and UTC offsets
    /// reach +/-14h, so the bounds are padded by a day on each side. Events
    /// outside the dates are filtered out later.
    pub fn covering(dates: &DateRange) -> Self {
        let first = dates.start.checked_sub_days(Days::new(1)).unwrap_or(dates.start);
        let after_last = dates.end.checked_add_days(Days::new(2)).unwrap_or(dates.end);
        Self {
            start: first.and_time(NaiveTime::MIN).and_utc(),
            end: after_last.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}
