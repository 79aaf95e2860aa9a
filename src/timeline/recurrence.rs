use std::iter;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

use super::types::Recurrence;
use super::vocab::DayToken;
use super::window::TimeWindow;
use super::zone::TimezoneMode;

/// Days past the window end still projected, so occurrences straddling the edge resolve.
pub const LOOKAHEAD_DAYS: i64 = 2;

/// How a sub-entry repeats, derived from its recurrence override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Default: every week on the descriptor's weekday.
    Weekly,
    /// Explicit override, optionally phase-anchored on a start date.
    Every {
        interval: Duration,
        anchor_date: Option<NaiveDate>,
    },
    /// One-time event on a fixed date.
    Once(NaiveDate),
}

impl Cadence {
    pub fn from_recurrence(recurrence: &Recurrence) -> Self {
        let recurring = recurrence.is_recurring.unwrap_or(false);
        match (recurring, recurrence.value, recurrence.start_date) {
            (true, Some(value), anchor_date) if value > 0 => {
                let unit = recurrence.unit.map(|u| u.days()).unwrap_or(7);
                Cadence::Every {
                    interval: Duration::days(i64::from(value) * unit),
                    anchor_date,
                }
            }
            (true, _, Some(anchor_date)) => Cadence::Every {
                interval: Duration::days(7),
                anchor_date: Some(anchor_date),
            },
            (false, _, Some(date)) => Cadence::Once(date),
            _ => Cadence::Weekly,
        }
    }

    pub fn is_repeating(&self) -> bool {
        !matches!(self, Cadence::Once(_))
    }
}

/// Anchor and spacing for one weekday+time token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// `None` anchors on the first window day (every-day tokens).
    pub anchor_weekday: Option<Weekday>,
    pub anchor_time: NaiveTime,
    pub anchor_date: Option<NaiveDate>,
    /// `None` emits the anchor alone.
    pub interval: Option<Duration>,
}

impl RecurrenceRule {
    pub fn new(day: DayToken, time: NaiveTime, cadence: &Cadence) -> Self {
        let anchor_weekday = match day {
            DayToken::Weekday(weekday) => Some(weekday),
            DayToken::EveryDay => None,
        };
        match (*cadence, day) {
            (Cadence::Once(date), _) => Self {
                anchor_weekday,
                anchor_time: time,
                anchor_date: Some(date),
                interval: None,
            },
            (Cadence::Every { interval, anchor_date }, _) => Self {
                anchor_weekday,
                anchor_time: time,
                anchor_date,
                interval: Some(interval),
            },
            (Cadence::Weekly, DayToken::EveryDay) => Self {
                anchor_weekday,
                anchor_time: time,
                anchor_date: None,
                interval: Some(Duration::days(1)),
            },
            (Cadence::Weekly, DayToken::Weekday(_)) => Self {
                anchor_weekday,
                anchor_time: time,
                anchor_date: None,
                interval: Some(Duration::days(7)),
            },
        }
    }

    fn anchor_instant(&self, window: &TimeWindow, source: TimezoneMode) -> DateTime<Utc> {
        let date = self.anchor_date.unwrap_or_else(|| {
            let first = source.date_of(window.start);
            (0..7)
                .map(|i| first + Duration::days(i))
                .find(|d| self.anchor_weekday.map_or(true, |w| d.weekday() == w))
                .unwrap_or(first)
        });
        source.to_instant(date.and_time(self.anchor_time))
    }

    /// Occurrence starts from one interval before the window up to the lookahead edge.
    pub fn project(&self, window: &TimeWindow, source: TimezoneMode) -> Vec<DateTime<Utc>> {
        let anchor = self.anchor_instant(window, source);
        let interval = match self.interval {
            Some(interval) if interval > Duration::zero() => interval,
            _ => return vec![anchor],
        };

        // Intervals reaching past the representable range leave the anchor as the only occurrence.
        let Some(floor) = window.start.checked_sub_signed(interval) else {
            return vec![anchor];
        };
        let limit = window
            .end
            .checked_add_signed(Duration::days(LOOKAHEAD_DAYS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        // Latest occurrence at or before `floor`, same phase as the anchor.
        let behind = (floor - anchor).num_milliseconds().rem_euclid(interval.num_milliseconds());
        let Some(first) = floor.checked_sub_signed(Duration::milliseconds(behind)) else {
            return vec![anchor];
        };

        iter::successors(Some(first), |at| at.checked_add_signed(interval))
            .take_while(|at| *at <= limit)
            .collect()
    }
}
