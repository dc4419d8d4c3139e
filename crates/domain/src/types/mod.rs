//! Domain types and models

pub mod availability;
pub mod calendar;

pub use availability::{BusyInterval, DateRange, DayResult, FreeSlot, PreferredWindow};
pub use calendar::{
    CalendarEvent, CalendarSummary, EventSpan, EventTime, TimeRange, TimedOrAllDay,
};
