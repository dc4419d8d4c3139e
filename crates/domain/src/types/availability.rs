//! Availability model: busy intervals in, free slots out

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::errors::{GapfinderError, Result};

/// Occupied span derived from one event (buffer already applied)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BusyInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BusyInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// User-declared time-of-day range on one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredWindow {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl PreferredWindow {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self { date, start_time, end_time }
    }

    /// Windows that do not end after they start are ignored by the calculator.
    pub fn is_valid(&self) -> bool {
        self.end_time > self.start_time
    }

    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn end(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }
}

/// Contiguous free span within one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl FreeSlot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self { start_time, end_time }
    }

    /// Length in whole minutes. A slot ending at midnight counts up to 24:00.
    pub fn duration_minutes(&self) -> i64 {
        let minutes = (self.end_time - self.start_time).num_minutes();
        if minutes <= 0 && self.end_time == NaiveTime::MIN {
            minutes + 24 * 60
        } else {
            minutes
        }
    }
}

/// Free slots found on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayResult {
    pub date: NaiveDate,
    pub slots: Vec<FreeSlot>,
    pub total_minutes: i64,
}

impl DayResult {
    pub fn new(date: NaiveDate, slots: Vec<FreeSlot>) -> Self {
        let total_minutes = slots.iter().map(FreeSlot::duration_minutes).sum();
        Self { date, slots, total_minutes }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// # Errors
    /// Returns `GapfinderError::InvalidInput` when `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(GapfinderError::InvalidInput(format!(
                "date range ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    pub fn len_days(&self) -> u64 {
        u64::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    /// Day after the last date, at midnight
    pub fn end_exclusive(&self) -> Option<NaiveDateTime> {
        self.end.checked_add_days(Days::new(1)).map(|day| day.and_time(NaiveTime::MIN))
    }
}
