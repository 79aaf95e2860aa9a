use chrono::{DateTime, Datelike, Timelike, Utc};

use super::types::{Interval, PositionedBar};
use super::vocab::Vocabulary;
use super::window::TimeWindow;
use super::zone::TimezoneMode;

/// Clips an interval to the window and converts it to percentages.
///
/// Returns `None` when nothing of the interval is visible. A bar that runs past the
/// window end is widened to the right edge so floating-point drift never leaves a gap.
pub fn position(
    interval: &Interval,
    window: &TimeWindow,
    display: TimezoneMode,
    vocab: &Vocabulary,
) -> Option<PositionedBar> {
    let clipped_start = interval.start.max(window.start);
    let clipped_end = interval.end.min(window.end);
    if clipped_start >= clipped_end {
        return None;
    }

    let left_percent = window.percent_of(clipped_start);
    let width_percent = if interval.end >= window.end {
        100.0 - left_percent
    } else {
        window.percent_of(clipped_end) - left_percent
    };

    Some(PositionedBar {
        start: interval.start,
        end: interval.end,
        is_range: interval.is_range,
        is_weekly: interval.is_weekly,
        left_percent,
        width_percent,
        time_text: time_text(interval, display, vocab),
        label: None,
    })
}

/// `13일(금) 09:00`
pub fn format_instant(at: DateTime<Utc>, display: TimezoneMode, vocab: &Vocabulary) -> String {
    let wall = display.wall(at);
    format!(
        "{}{}({}) {:02}:{:02}",
        wall.day(),
        vocab.day_of_month_suffix,
        vocab.weekday_label(wall.weekday()),
        wall.hour(),
        wall.minute()
    )
}

/// Start for point events; `start ~ HH:MM` for same-day ranges; both ends in full otherwise.
pub fn time_text(interval: &Interval, display: TimezoneMode, vocab: &Vocabulary) -> String {
    let start = format_instant(interval.start, display, vocab);
    if !interval.is_range {
        return start;
    }
    let end_wall = display.wall(interval.end);
    if display.date_of(interval.start) == end_wall.date() {
        format!("{} ~ {:02}:{:02}", start, end_wall.hour(), end_wall.minute())
    } else {
        format!("{} ~ {}", start, format_instant(interval.end, display, vocab))
    }
}
