//! Shared test helpers for `gapfinder-core` integration tests.

#![allow(dead_code)]

pub mod calendar;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use gapfinder_domain::CalendarEvent;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Timed event from two RFC 3339 strings.
pub fn timed_event(id: &str, start: &str, end: &str) -> CalendarEvent {
    let parse = |value: &str| -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    };
    CalendarEvent::timed(id, parse(start), parse(end))
}
