//! Event to busy-interval conversion

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use gapfinder_domain::{BusyInterval, EventSpan};

/// Busy interval for one span, with the buffer applied to timed events
///
/// All-day events run from midnight of their first date to midnight after
/// their last one, so nothing of a covered date is left free.
pub fn to_busy_interval(span: &EventSpan, buffer: TimeDelta) -> BusyInterval {
    match *span {
        EventSpan::Timed { start, end } => {
            let start = start.checked_sub_signed(buffer).unwrap_or(start);
            let end = end.checked_add_signed(buffer).unwrap_or(end);
            BusyInterval::new(start, end)
        }
        EventSpan::AllDay { start, end_exclusive } => BusyInterval::new(
            start.and_time(NaiveTime::MIN),
            end_exclusive.and_time(NaiveTime::MIN),
        ),
    }
}

/// Busy intervals relevant to `date`, sorted by start
pub fn busy_intervals_on(
    spans: &[EventSpan],
    date: NaiveDate,
    buffer: TimeDelta,
) -> Vec<BusyInterval> {
    let mut intervals: Vec<BusyInterval> = spans
        .iter()
        .filter(|span| span.falls_on(date))
        .map(|span| to_busy_interval(span, buffer))
        .collect();
    intervals.sort_by_key(|interval| (interval.start, interval.end));
    intervals
}
