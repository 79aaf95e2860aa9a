//! Parses free-form event schedule strings and lays their occurrences out on a
//! rolling 7-day timeline.

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod timeline;
pub mod web;

pub use error::TimelineError;
pub use timeline::{
    compute_timeline, now_marker_percent, PositionedBar, ScheduleEntry, TimeWindow, Timeline,
    TimelineOptions, TimelineRow, TimezoneMode, Vocabulary,
};
