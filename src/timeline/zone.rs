use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::TimelineError;

/// Which wall clock a pass reads and writes.
///
/// `Fixed` pins an offset such as KST (+09:00) regardless of the host zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimezoneMode {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl TimezoneMode {
    /// Absolute instant of a wall-clock reading in this zone.
    pub fn to_instant(self, naive: NaiveDateTime) -> DateTime<Utc> {
        match self {
            TimezoneMode::Utc => Utc.from_utc_datetime(&naive),
            TimezoneMode::Fixed(offset) => resolve(&offset, naive),
            TimezoneMode::Local => resolve(&Local, naive),
        }
    }

    /// Wall-clock reading of an instant in this zone.
    pub fn wall(self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            TimezoneMode::Utc => instant.naive_utc(),
            TimezoneMode::Fixed(offset) => instant.with_timezone(&offset).naive_local(),
            TimezoneMode::Local => instant.with_timezone(&Local).naive_local(),
        }
    }

    pub fn date_of(self, instant: DateTime<Utc>) -> NaiveDate {
        self.wall(instant).date()
    }

    /// Start of the given calendar day in this zone.
    pub fn midnight(self, date: NaiveDate) -> DateTime<Utc> {
        self.to_instant(date.and_time(NaiveTime::MIN))
    }
}

// DST gaps resolve to the first valid reading after the gap, overlaps to the earlier mapping.
fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

impl FromStr for TimezoneMode {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(TimezoneMode::Local),
            "utc" | "z" => Ok(TimezoneMode::Utc),
            _ => value
                .parse::<FixedOffset>()
                .map(TimezoneMode::Fixed)
                .map_err(|_| TimelineError::InvalidTimezone(value.to_string())),
        }
    }
}

impl fmt::Display for TimezoneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimezoneMode::Local => write!(f, "LOCAL"),
            TimezoneMode::Utc => write!(f, "UTC"),
            TimezoneMode::Fixed(offset) => write!(f, "UTC{}", offset),
        }
    }
}
