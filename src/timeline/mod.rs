//! Schedule descriptor parsing and 7-day timeline positioning.
//!
//! [`Timeline`] runs the whole pass: expand entries into tracks, recognize each
//! track's descriptor, project recurrences, clip to the window, and attach labels.

pub mod expand;
pub mod grammar;
pub mod label;
pub mod position;
pub mod recurrence;
pub mod types;
pub mod vocab;
pub mod window;
pub mod zone;

use chrono::{DateTime, Utc};

use crate::error::TimelineError;

pub use expand::{Expander, TrackFamily};
pub use grammar::{Grammar, ParseContext};
pub use label::LabelCleaner;
pub use position::{format_instant, position};
pub use recurrence::{Cadence, RecurrenceRule};
pub use types::{
    Interval, PositionedBar, Recognition, Recurrence, RecurrenceUnit, ScheduleEntry, SubEntry,
    TimelineRow,
};
pub use vocab::{DayToken, Vocabulary};
pub use window::{now_marker_percent, TimeWindow};
pub use zone::TimezoneMode;

#[derive(Debug, Clone, Default)]
pub struct TimelineOptions {
    /// Zone the descriptors were written in.
    pub source: TimezoneMode,
    pub vocabulary: Vocabulary,
}

/// Compiled engine for one vocabulary and source zone.
#[derive(Debug, Clone)]
pub struct Timeline {
    grammar: Grammar,
    labels: LabelCleaner,
    expander: Expander,
    vocabulary: Vocabulary,
    source: TimezoneMode,
}

impl Timeline {
    pub fn new(options: TimelineOptions) -> Result<Self, TimelineError> {
        Ok(Self {
            grammar: Grammar::new(&options.vocabulary)?,
            labels: LabelCleaner::new(&options.vocabulary)?,
            expander: Expander::new(&options.vocabulary)?,
            vocabulary: options.vocabulary,
            source: options.source,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn window(&self, now: DateTime<Utc>, display: TimezoneMode) -> TimeWindow {
        TimeWindow::containing(now, display)
    }

    /// One row per sub-entry with at least one visible bar, in entry order.
    pub fn compute(
        &self,
        entries: &[ScheduleEntry],
        now: DateTime<Utc>,
        display: TimezoneMode,
    ) -> Vec<TimelineRow> {
        let window = self.window(now, display);
        entries
            .iter()
            .flat_map(|entry| self.expander.expand(entry))
            .filter_map(|sub| {
                let bars = self.bars(&sub, &window, now, display);
                if bars.is_empty() {
                    return None;
                }
                Some(TimelineRow {
                    title: sub.display_title(),
                    id: sub.id,
                    parent_id: sub.parent_id,
                    category: sub.category,
                    track: sub.track,
                    bars,
                })
            })
            .collect()
    }

    /// Visible bars of one sub-entry, ordered by start.
    pub fn bars(
        &self,
        sub: &SubEntry,
        window: &TimeWindow,
        now: DateTime<Utc>,
        display: TimezoneMode,
    ) -> Vec<PositionedBar> {
        let descriptor = sub.descriptor();
        if descriptor.is_empty() {
            return Vec::new();
        }
        let ctx = ParseContext {
            window,
            now,
            source: self.source,
            default_span: sub.default_span(),
            cadence: Cadence::from_recurrence(&sub.recurrence),
        };

        let mut bars: Vec<PositionedBar> = self
            .grammar
            .dispatch(&descriptor, &ctx)
            .iter()
            .flat_map(|recognition| {
                let label = self
                    .labels
                    .reconstruct(&recognition.segment, &recognition.matched_texts());
                recognition.intervals.iter().filter_map(move |interval| {
                    position(interval, window, display, &self.vocabulary).map(|bar| PositionedBar {
                        label: label.clone(),
                        ..bar
                    })
                })
            })
            .collect();
        bars.sort_by_key(|bar| bar.start);
        bars
    }
}

/// Builds a [`Timeline`] from `options` and runs a single pass.
pub fn compute_timeline(
    entries: &[ScheduleEntry],
    now: DateTime<Utc>,
    display: TimezoneMode,
    options: &TimelineOptions,
) -> Result<Vec<TimelineRow>, TimelineError> {
    Ok(Timeline::new(options.clone())?.compute(entries, now, display))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn timeline() -> Timeline {
        Timeline::new(TimelineOptions {
            source: TimezoneMode::Utc,
            vocabulary: Vocabulary::default(),
        })
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 11, 12, 0, 0).unwrap()
    }

    fn entry(id: &str, day: &str, time: &str) -> ScheduleEntry {
        ScheduleEntry {
            id: id.to_string(),
            title: Some(id.to_uppercase()),
            day: day.to_string(),
            time: time.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn rows_without_bars_are_omitted() {
        let rows = timeline().compute(
            &[entry("kvk", "토", "22:00"), entry("notice", "", "상시"), entry("blank", ".", ".")],
            now(),
            TimezoneMode::Utc,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "kvk");
        assert_eq!(rows[0].bars.len(), 1);
    }

    #[test]
    fn bars_carry_reconstructed_labels() {
        let rows = timeline().compute(
            &[entry("fortress", "", "요새전: 요새1 토(22:00), 요새2 토(23:00)")],
            now(),
            TimezoneMode::Utc,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "FORTRESS (요새전)");
        let labels: Vec<_> = rows[0].bars.iter().map(|b| b.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("요새1"), Some("요새2")]);
    }

    #[test]
    fn bars_are_sorted_by_start() {
        let rows = timeline().compute(&[entry("raid", "", "목 20:00 / 월 20:00")], now(), TimezoneMode::Utc);
        let starts: Vec<_> = rows[0].bars.iter().map(|b| b.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert_eq!(starts.len(), 2);
    }
}
