use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::zone::TimezoneMode;

/// Number of day columns on the timeline.
pub const WINDOW_DAYS: i64 = 7;
/// Day columns shown before today.
pub const DAYS_BEFORE_TODAY: i64 = 2;

/// The 7-day span rendered on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window starting at midnight two days before `now`'s date in `mode`, so today
    /// lands in the third column.
    pub fn containing(now: DateTime<Utc>, mode: TimezoneMode) -> Self {
        let today = mode.date_of(now);
        let start = mode.midnight(today - Duration::days(DAYS_BEFORE_TODAY));
        Self {
            start,
            end: start + Duration::days(WINDOW_DAYS),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Calendar dates of the day columns, read in `mode`.
    pub fn day_columns(&self, mode: TimezoneMode) -> Vec<NaiveDate> {
        let first = mode.date_of(self.start);
        (0..WINDOW_DAYS).map(|i| first + Duration::days(i)).collect()
    }

    /// Horizontal position of `instant` as a percentage of the window.
    pub fn percent_of(&self, instant: DateTime<Utc>) -> f64 {
        let total = self.duration().num_milliseconds() as f64;
        (instant - self.start).num_milliseconds() as f64 / total * 100.0
    }
}

/// Offset of the "now" indicator line.
pub fn now_marker_percent(now: DateTime<Utc>, window: &TimeWindow) -> f64 {
    window.percent_of(now).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Weekday, Datelike};

    #[test]
    fn window_spans_seven_days_from_two_days_ago() {
        // Wednesday afternoon
        let now = Utc.with_ymd_and_hms(2026, 2, 11, 15, 30, 0).unwrap();
        let window = TimeWindow::containing(now, TimezoneMode::Utc);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 2, 9, 0, 0, 0).unwrap());
        assert_eq!(window.duration(), Duration::days(7));
        assert!(window.contains(now));
        assert!(now < window.start + Duration::days(3));
    }

    #[test]
    fn window_follows_display_zone_midnight() {
        // 2026-02-11 20:00 UTC is already Thursday 05:00 in KST
        let now = Utc.with_ymd_and_hms(2026, 2, 11, 20, 0, 0).unwrap();
        let kst = TimezoneMode::Fixed(FixedOffset::east_opt(9 * 3600).unwrap());
        let window = TimeWindow::containing(now, kst);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 2, 9, 15, 0, 0).unwrap());
        let columns = window.day_columns(kst);
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[2].weekday(), Weekday::Thu);
    }

    #[test]
    fn now_marker_sits_in_third_column() {
        let now = Utc.with_ymd_and_hms(2026, 2, 11, 12, 0, 0).unwrap();
        let window = TimeWindow::containing(now, TimezoneMode::Utc);
        let marker = now_marker_percent(now, &window);
        assert!(marker > 2.0 / 7.0 * 100.0 && marker < 3.0 / 7.0 * 100.0);
    }
}
