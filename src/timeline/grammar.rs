//! Recognizers for free-form schedule descriptors.
//!
//! A descriptor is split on `/` into parts. Each part is offered to the recognizers in
//! [`RECOGNIZERS`] order and the first one that produces intervals wins that part.

use std::collections::HashMap;
use std::iter;
use std::ops::Range;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use lazy_static::lazy_static;
use regex::{Captures, Match, Regex};
use tracing::{debug, trace};

use super::recurrence::{Cadence, RecurrenceRule};
use super::types::{Interval, Recognition};
use super::vocab::{alternation, DayToken, Vocabulary};
use super::window::TimeWindow;
use super::zone::TimezoneMode;

lazy_static! {
    pub(crate) static ref CLOCK: Regex =
        Regex::new(r"\d{1,2}:\d{2}").expect("Failed to compile CLOCK regex");
    static ref ISO_DATE: Regex =
        Regex::new(r"\d{2,4}[./-]\d{1,2}[./-]\d{1,2}").expect("Failed to compile ISO_DATE regex");
    static ref ISO_RANGE: Regex = Regex::new(
        r"(?P<sd>\d{2,4}[./-]\d{1,2}[./-]\d{1,2})\s*(?:\([^)\d]*\))?\s*(?P<st>\d{1,2}:\d{2})?\s*~\s*(?P<ed>(?:\d{2,4}[./-])?\d{1,2}[./-]\d{1,2})?\s*(?:\([^)\d]*\))?\s*(?P<et>\d{1,2}:\d{2})?"
    )
    .expect("Failed to compile ISO_RANGE regex");
    static ref ISO_SINGLE: Regex = Regex::new(
        r"(?P<d>\d{2,4}[./-]\d{1,2}[./-]\d{1,2})\s*(?:\([^)\d]*\))?\s*(?P<t>\d{1,2}:\d{2})?"
    )
    .expect("Failed to compile ISO_SINGLE regex");
    static ref SLASH_DATE: Regex =
        Regex::new(r"(?:^|[^\d:])(?P<date>(?:\d{2,4}/)?\d{1,2}/\d{1,2})")
            .expect("Failed to compile SLASH_DATE regex");
}

fn start_of_day() -> NaiveTime {
    NaiveTime::MIN
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// Everything a recognizer needs besides the text itself.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub window: &'a TimeWindow,
    pub now: DateTime<Utc>,
    /// Zone the descriptor was authored in.
    pub source: TimezoneMode,
    /// Length of occurrences without an explicit end.
    pub default_span: Duration,
    pub cadence: Cadence,
}

pub type Recognizer = fn(&Grammar, &str, &ParseContext<'_>) -> Option<Vec<Recognition>>;

/// Recognizers in priority order.
pub const RECOGNIZERS: [(&str, Recognizer); 6] = [
    ("explicit list", Grammar::explicit_list),
    ("date range", Grammar::iso_range),
    ("single date", Grammar::iso_single),
    ("day of month", Grammar::day_of_month),
    ("multi-day", Grammar::multi_day),
    ("weekly", Grammar::weekly),
];

/// Compiled patterns for one [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct Grammar {
    days: HashMap<String, DayToken>,
    list_pattern: Regex,
    multi_day_pattern: Regex,
    day_token: Regex,
    weekly_pattern: Regex,
    dom_any: Regex,
    dom_range: Regex,
    dom_single: Regex,
}

impl Grammar {
    pub fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        let day = vocab.day_pattern();
        let suffix = vocab.suffix_pattern();
        let dom = alternation(iter::once(vocab.day_of_month_suffix.as_str()));
        let clock = r"\(?\s*(?P<time>\d{1,2}:\d{2})\s*\)?";

        Ok(Self {
            days: vocab.day_lookup(),
            list_pattern: Regex::new(&format!(
                r"^(?:(?P<label>.+?)(?:\s*[:：]\s*|\s+))?(?P<slot>(?P<day>{day}){suffix}\s*{clock})$"
            ))?,
            multi_day_pattern: Regex::new(&format!(
                r"(?P<days>{day}{suffix}(?:\s*[,，·]\s*{day}{suffix})+)\s*{clock}"
            ))?,
            day_token: Regex::new(&format!(r"(?P<day>{day}){suffix}"))?,
            weekly_pattern: Regex::new(&format!(
                r"(?P<sd>{day}){suffix}\s*\(?\s*(?P<st>\d{{1,2}}:\d{{2}})\s*\)?(?:\s*~\s*(?:(?P<ed>{day}){suffix})?\s*\(?\s*(?P<et>\d{{1,2}}:\d{{2}})\s*\)?)?"
            ))?,
            dom_any: Regex::new(&format!(r"\d{{1,2}}{dom}"))?,
            dom_range: Regex::new(&format!(
                r"(?P<sd>\d{{1,2}}){dom}(?:\s*\([^)\d]*\))?(?:\s*\(?\s*(?P<st>\d{{1,2}}:\d{{2}})\s*\)?)?\s*~\s*(?P<ed>\d{{1,2}}){dom}(?:\s*\([^)\d]*\))?(?:\s*\(?\s*(?P<et>\d{{1,2}}:\d{{2}})\s*\)?)?"
            ))?,
            dom_single: Regex::new(&format!(
                r"(?P<d>\d{{1,2}}){dom}(?:\s*\([^)\d]*\))?\s*\(?\s*(?P<t>\d{{1,2}}:\d{{2}})\s*\)?"
            ))?,
        })
    }

    /// Recognizes every `/`-separated part of a descriptor.
    pub fn dispatch(&self, descriptor: &str, ctx: &ParseContext<'_>) -> Vec<Recognition> {
        split_parts(descriptor)
            .into_iter()
            .flat_map(|part| self.recognize_part(part, ctx))
            .collect()
    }

    /// Runs the priority chain on a single part. Unparseable parts yield nothing.
    pub fn recognize_part(&self, part: &str, ctx: &ParseContext<'_>) -> Vec<Recognition> {
        RECOGNIZERS
            .iter()
            .find_map(|(name, recognize)| {
                let found = recognize(self, part, ctx)?;
                trace!(recognizer = *name, part, "schedule part recognized");
                Some(found)
            })
            .unwrap_or_else(|| {
                debug!(part, "no recognizer matched schedule part");
                Vec::new()
            })
    }

    fn lookup(&self, token: &str) -> Option<DayToken> {
        self.days.get(&token.to_lowercase()).copied()
    }

    fn weekly_intervals(
        &self,
        day: DayToken,
        time: NaiveTime,
        span: Duration,
        is_range: bool,
        matched: &str,
        ctx: &ParseContext<'_>,
    ) -> Vec<Interval> {
        let rule = RecurrenceRule::new(day, time, &ctx.cadence);
        let is_weekly = ctx.cadence.is_repeating();
        rule.project(ctx.window, ctx.source)
            .into_iter()
            .map(|start| Interval {
                start,
                end: start + span,
                is_range,
                is_weekly,
                matched_text: matched.to_string(),
            })
            .collect()
    }

    /// `요새1 토(22:00), 요새2 토(23:00)`: every comma entry is a weekday slot with an optional label.
    pub fn explicit_list(&self, part: &str, ctx: &ParseContext<'_>) -> Option<Vec<Recognition>> {
        if ISO_DATE.is_match(part) || self.dom_any.is_match(part) {
            return None;
        }
        let entries: Vec<&str> = part
            .split([',', '，'])
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();
        // A lone unlabeled slot is plain weekly text.
        match entries.as_slice() {
            [] => return None,
            [only] if self.list_pattern.captures(only).is_some_and(|caps| caps.name("label").is_none()) => {
                return None
            }
            _ => {}
        }
        entries
            .into_iter()
            .map(|entry| self.list_slot(entry, ctx))
            .collect()
    }

    fn list_slot(&self, entry: &str, ctx: &ParseContext<'_>) -> Option<Recognition> {
        let caps = self.list_pattern.captures(entry)?;
        if let Some(label) = caps.name("label") {
            if label.as_str().contains('~') || CLOCK.is_match(label.as_str()) {
                return None;
            }
        }
        let day = self.lookup(&caps["day"])?;
        let time = parse_clock(&caps["time"])?;
        let intervals = self.weekly_intervals(day, time, ctx.default_span, false, &caps["slot"], ctx);
        Some(Recognition {
            segment: entry.to_string(),
            intervals,
        })
    }

    /// `2026.02.13 (금) 09:00 ~ 02.15 09:00`
    pub fn iso_range(&self, part: &str, ctx: &ParseContext<'_>) -> Option<Vec<Recognition>> {
        let caps = ISO_RANGE.captures(part)?;
        let (start_date, _) = parse_date(&caps["sd"], ctx.source.date_of(ctx.now).year())?;
        let start_time = clock_or(caps.name("st"), start_of_day())?;
        let end_time = clock_or(caps.name("et"), end_of_day())?;
        let end_date = match caps.name("ed") {
            Some(ed) => {
                let (date, explicit_year) = parse_date(ed.as_str(), start_date.year())?;
                if !explicit_year && date < start_date {
                    date.with_year(date.year() + 1)?
                } else {
                    date
                }
            }
            None => start_date,
        };

        let start = ctx.source.to_instant(start_date.and_time(start_time));
        let mut end = ctx.source.to_instant(end_date.and_time(end_time));
        if caps.name("ed").is_none() && end <= start {
            end += Duration::days(1);
        }
        Some(single(
            part,
            Interval {
                start,
                end,
                is_range: true,
                is_weekly: false,
                matched_text: caps[0].to_string(),
            },
        ))
    }

    /// `2026.02.13 09:00`, one default-length occurrence.
    pub fn iso_single(&self, part: &str, ctx: &ParseContext<'_>) -> Option<Vec<Recognition>> {
        let caps = ISO_SINGLE.captures(part)?;
        let (date, _) = parse_date(&caps["d"], ctx.source.date_of(ctx.now).year())?;
        let time = clock_or(caps.name("t"), start_of_day())?;
        let start = ctx.source.to_instant(date.and_time(time));
        Some(single(
            part,
            Interval {
                start,
                end: start + ctx.default_span,
                is_range: false,
                is_weekly: false,
                matched_text: caps[0].to_string(),
            },
        ))
    }

    /// `15일 10:00 ~ 17일 22:00` or `15일 21:00`, tried in the previous, current and next month.
    pub fn day_of_month(&self, part: &str, ctx: &ParseContext<'_>) -> Option<Vec<Recognition>> {
        let today = ctx.source.date_of(ctx.now);
        let first_of_month = today.with_day(1)?;
        let months: Vec<NaiveDate> = (-1..=1)
            .filter_map(|offset| shift_month(first_of_month, offset))
            .collect();

        let intervals: Vec<Interval> = if let Some(caps) = self.dom_range.captures(part) {
            let start_day: u32 = caps["sd"].parse().ok()?;
            let end_day: u32 = caps["ed"].parse().ok()?;
            let start_time = clock_or(caps.name("st"), start_of_day())?;
            let end_time = clock_or(caps.name("et"), end_of_day())?;
            months
                .iter()
                .filter_map(|month| {
                    let start_date = month.with_day(start_day)?;
                    let start = ctx.source.to_instant(start_date.and_time(start_time));
                    let same_month = month
                        .with_day(end_day)
                        .map(|date| ctx.source.to_instant(date.and_time(end_time)))
                        .filter(|end| *end >= start);
                    let end = match same_month {
                        Some(end) => end,
                        None => {
                            let next = shift_month(*month, 1)?.with_day(end_day)?;
                            ctx.source.to_instant(next.and_time(end_time))
                        }
                    };
                    Some(Interval {
                        start,
                        end,
                        is_range: true,
                        is_weekly: false,
                        matched_text: caps[0].to_string(),
                    })
                })
                .collect()
        } else {
            let caps = self.dom_single.captures(part)?;
            let day: u32 = caps["d"].parse().ok()?;
            let time = parse_clock(&caps["t"])?;
            months
                .iter()
                .filter_map(|month| {
                    let start = ctx.source.to_instant(month.with_day(day)?.and_time(time));
                    Some(Interval {
                        start,
                        end: start + ctx.default_span,
                        is_range: false,
                        is_weekly: false,
                        matched_text: caps[0].to_string(),
                    })
                })
                .collect()
        };
        non_empty(part, intervals)
    }

    /// `월,화,수 22:00`: one occurrence per listed weekday, all at the same time.
    pub fn multi_day(&self, part: &str, ctx: &ParseContext<'_>) -> Option<Vec<Recognition>> {
        let caps = self.multi_day_pattern.captures(part)?;
        let time = parse_clock(&caps["time"])?;
        let matched = &caps[0];
        let intervals: Vec<Interval> = self
            .day_token
            .captures_iter(&caps["days"])
            .filter_map(|day| self.lookup(&day["day"]))
            .flat_map(|day| self.weekly_intervals(day, time, ctx.default_span, false, matched, ctx))
            .collect();
        non_empty(part, intervals)
    }

    /// `화 22:00`, `금 09:00 ~ 일 09:00`, `매일 12:00`: the default weekly grammar.
    pub fn weekly(&self, part: &str, ctx: &ParseContext<'_>) -> Option<Vec<Recognition>> {
        let intervals: Vec<Interval> = self
            .weekly_pattern
            .captures_iter(part)
            .filter(|caps| !preceded_by_digit(part, caps.get(0).map_or(0, |m| m.start())))
            .filter_map(|caps| self.weekly_slot(&caps, ctx))
            .flatten()
            .collect();
        non_empty(part, intervals)
    }

    fn weekly_slot(&self, caps: &Captures<'_>, ctx: &ParseContext<'_>) -> Option<Vec<Interval>> {
        let start_day = self.lookup(&caps["sd"])?;
        let start_time = parse_clock(&caps["st"])?;
        let (span, is_range) = match caps.name("et") {
            Some(et) => {
                let end_time = parse_clock(et.as_str())?;
                let end_day = match caps.name("ed") {
                    Some(ed) => self.lookup(ed.as_str())?,
                    None => start_day,
                };
                (range_span(start_day, start_time, end_day, end_time), true)
            }
            None => (ctx.default_span, false),
        };
        Some(self.weekly_intervals(start_day, start_time, span, is_range, &caps[0], ctx))
    }
}

/// Length of a weekday range; a same-day range whose end is not after its start runs overnight.
fn range_span(start_day: DayToken, start_time: NaiveTime, end_day: DayToken, end_time: NaiveTime) -> Duration {
    let days = match (start_day, end_day) {
        (DayToken::Weekday(from), DayToken::Weekday(to)) => {
            (i64::from(to.num_days_from_sunday()) - i64::from(from.num_days_from_sunday())).rem_euclid(7)
        }
        _ => 0,
    };
    let span = Duration::days(days) + end_time.signed_duration_since(start_time);
    if days == 0 && span <= Duration::zero() {
        span + Duration::days(1)
    } else {
        span
    }
}

fn single(part: &str, interval: Interval) -> Vec<Recognition> {
    vec![Recognition {
        segment: part.to_string(),
        intervals: vec![interval],
    }]
}

fn non_empty(part: &str, intervals: Vec<Interval>) -> Option<Vec<Recognition>> {
    if intervals.is_empty() {
        None
    } else {
        Some(vec![Recognition {
            segment: part.to_string(),
            intervals,
        }])
    }
}

fn preceded_by_digit(text: &str, at: usize) -> bool {
    text[..at].chars().next_back().is_some_and(|c| c.is_ascii_digit())
}

fn shift_month(first_of_month: NaiveDate, offset: i32) -> Option<NaiveDate> {
    if offset >= 0 {
        first_of_month.checked_add_months(Months::new(offset.unsigned_abs()))
    } else {
        first_of_month.checked_sub_months(Months::new(offset.unsigned_abs()))
    }
}

fn clock_or(found: Option<Match<'_>>, default: NaiveTime) -> Option<NaiveTime> {
    match found {
        Some(m) => parse_clock(m.as_str()),
        None => Some(default),
    }
}

/// Parses `H:MM`/`HH:MM`; out-of-range values fail.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    let (hours, minutes) = text.trim().split_once(':')?;
    NaiveTime::from_hms_opt(hours.parse().ok()?, minutes.parse().ok()?, 0)
}

/// Parses `YYYY.MM.DD`, `YY-MM-DD` or `MM/DD`. The flag tells whether a year was written.
pub fn parse_date(text: &str, default_year: i32) -> Option<(NaiveDate, bool)> {
    let parts: Vec<u32> = text
        .split(['.', '-', '/'])
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    let (year, month, day, explicit) = match parts.as_slice() {
        [y, m, d] if *y < 100 => (2000 + *y as i32, *m, *d, true),
        [y, m, d] => (*y as i32, *m, *d, true),
        [m, d] => (default_year, *m, *d, false),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day).map(|date| (date, explicit))
}

/// Byte ranges of slash-written dates (`2026/02/13`, `02/15`); clock digits like `22:00/23:00` are not dates.
fn slash_dates(text: &str) -> Vec<Range<usize>> {
    SLASH_DATE
        .captures_iter(text)
        .filter_map(|caps| caps.name("date"))
        .filter(|m| !text[m.end()..].chars().next().is_some_and(|c| c == ':' || c.is_ascii_digit()))
        .map(|m| m.range())
        .collect()
}

/// Splits on `/` separators, leaving slashes inside dates (`2026/02/13`) alone.
/// Blank parts are kept so callers can map parts positionally.
pub fn split_on_slash(text: &str) -> Vec<&str> {
    let dates = slash_dates(text);
    let mut parts = Vec::new();
    let mut start = 0;
    for (at, _) in text.match_indices('/') {
        if dates.iter().any(|date| date.contains(&at)) {
            continue;
        }
        parts.push(text[start..at].trim());
        start = at + 1;
    }
    parts.push(text[start..].trim());
    if parts.iter().all(|p| p.is_empty()) {
        return Vec::new();
    }
    parts
}

/// Non-blank `/` parts of a descriptor.
pub fn split_parts(descriptor: &str) -> Vec<&str> {
    split_on_slash(descriptor)
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect()
}
