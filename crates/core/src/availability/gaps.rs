//! Window sweep and slot merging

use chrono::{NaiveDateTime, TimeDelta};
use gapfinder_domain::BusyInterval;

/// Half-open span of free time
pub type Gap = (NaiveDateTime, NaiveDateTime);

/// Free gaps inside `[window_start, window_end)` not covered by `busy`
///
/// `busy` must be sorted by start. Gaps shorter than `min_duration` are
/// dropped.
pub fn scan_window(
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
    busy: &[BusyInterval],
    min_duration: TimeDelta,
) -> Vec<Gap> {
    let mut gaps = Vec::new();
    let mut cursor = window_start;

    for interval in busy {
        if interval.end <= cursor {
            continue;
        }
        if interval.start >= window_end {
            break;
        }
        if cursor < interval.start {
            gaps.push((cursor, interval.start.min(window_end)));
        }
        cursor = cursor.max(interval.end);
        if cursor >= window_end {
            break;
        }
    }

    if cursor < window_end {
        gaps.push((cursor, window_end));
    }

    gaps.retain(|(start, end)| *end - *start >= min_duration);
    gaps
}

/// Merge overlapping or touching gaps into a sorted, disjoint list
pub fn merge_gaps(mut gaps: Vec<Gap>) -> Vec<Gap> {
    gaps.sort();

    let mut merged: Vec<Gap> = Vec::with_capacity(gaps.len());
    for (start, end) in gaps {
        match merged.last_mut() {
            Some(current) if start <= current.1 => current.1 = current.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
