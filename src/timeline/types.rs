use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unit of a recurrence override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Day,
    Week,
}

impl RecurrenceUnit {
    pub fn days(self) -> i64 {
        match self {
            RecurrenceUnit::Day => 1,
            RecurrenceUnit::Week => 7,
        }
    }
}

/// A schedule row as authored by alliance admins.
///
/// `day` and `time` are free text ("화", "22:00", "2026.02.13 09:00 ~ 02.15 09:00").
/// Fields suffixed with `2` describe the second track of a dual-track event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleEntry {
    pub id: String,
    pub title: Option<String>,
    pub day: String,
    pub time: String,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub recurrence_value: Option<u32>,
    pub recurrence_unit: Option<RecurrenceUnit>,
    pub start_date2: Option<NaiveDate>,
    pub is_recurring2: Option<bool>,
    pub recurrence_value2: Option<u32>,
    pub recurrence_unit2: Option<RecurrenceUnit>,
}

impl ScheduleEntry {
    /// Recurrence fields of the first track.
    pub fn primary_recurrence(&self) -> Recurrence {
        Recurrence {
            is_recurring: self.is_recurring,
            value: self.recurrence_value,
            unit: self.recurrence_unit,
            start_date: self.start_date,
        }
    }

    /// Recurrence fields of the second track.
    pub fn secondary_recurrence(&self) -> Recurrence {
        Recurrence {
            is_recurring: self.is_recurring2,
            value: self.recurrence_value2,
            unit: self.recurrence_unit2,
            start_date: self.start_date2,
        }
    }
}

/// Recurrence override attached to one track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recurrence {
    pub is_recurring: Option<bool>,
    pub value: Option<u32>,
    pub unit: Option<RecurrenceUnit>,
    pub start_date: Option<NaiveDate>,
}

/// One independently scheduled track produced by the expander.
#[derive(Debug, Clone, PartialEq)]
pub struct SubEntry {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub category: Option<String>,
    pub day: String,
    pub time: String,
    pub track: Option<String>,
    pub recurrence: Recurrence,
    pub is_bear_hunt: bool,
}

impl SubEntry {
    /// Day and time joined into one descriptor, with `"."` and blanks treated as absent.
    pub fn descriptor(&self) -> String {
        [self.day.as_str(), self.time.as_str()]
            .iter()
            .map(|field| field.trim())
            .filter(|field| !field.is_empty() && *field != ".")
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Length of an occurrence that carries no explicit end.
    pub fn default_span(&self) -> Duration {
        if self.is_bear_hunt {
            Duration::minutes(30)
        } else {
            Duration::hours(1)
        }
    }

    pub fn display_title(&self) -> String {
        match &self.track {
            Some(track) => format!("{} ({})", self.title, track),
            None => self.title.clone(),
        }
    }
}

/// A raw occurrence before clipping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_range: bool,
    pub is_weekly: bool,
    pub matched_text: String,
}

/// Intervals recognized from one segment of a descriptor, together with that segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub segment: String,
    pub intervals: Vec<Interval>,
}

impl Recognition {
    /// Distinct matched substrings in first-seen order.
    pub fn matched_texts(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for interval in &self.intervals {
            let text = interval.matched_text.as_str();
            if !text.is_empty() && !seen.contains(&text) {
                seen.push(text);
            }
        }
        seen
    }
}

/// A clipped occurrence placed on the window.
///
/// `start`/`end` keep the true occurrence bounds; the percentages describe the clipped bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedBar {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_range: bool,
    pub is_weekly: bool,
    pub left_percent: f64,
    pub width_percent: f64,
    pub time_text: String,
    pub label: Option<String>,
}

/// Everything the caller needs to draw one timeline row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRow {
    pub id: String,
    pub parent_id: String,
    pub category: Option<String>,
    pub title: String,
    pub track: Option<String>,
    pub bars: Vec<PositionedBar>,
}
