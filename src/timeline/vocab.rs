//! Token tables for the authoring language.
//!
//! Nothing in the grammar hard-codes a weekday spelling; every token comes from a
//! [`Vocabulary`], which can be replaced by a JSON file.

use std::collections::HashMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// A day reference found in a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayToken {
    Weekday(Weekday),
    EveryDay,
}

/// Weekday order used by the token table, Sunday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Tokens per weekday, Sunday first. The first token is used when formatting.
    pub weekdays: [Vec<String>; 7],
    pub every_day: Vec<String>,
    /// Optional text glued after a weekday token ("월요일").
    pub weekday_suffixes: Vec<String>,
    /// Suffix marking a day-of-month number ("15일").
    pub day_of_month_suffix: String,
    /// Leading event-type markers stripped from labels ("요새전:").
    pub event_prefixes: Vec<String>,
    /// Markers that route a fortress segment into the citadel bucket.
    pub citadel_markers: Vec<String>,
    pub fortress_label: String,
    pub citadel_label: String,
    /// Words dropped from explicit track labels ("1군" -> "1").
    pub team_words: Vec<String>,
    /// Action words dropped from track times ("출격", "귀환").
    pub noise_words: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            weekdays: [
                words(&["일", "sun", "sunday"]),
                words(&["월", "mon", "monday"]),
                words(&["화", "tue", "tuesday"]),
                words(&["수", "wed", "wednesday"]),
                words(&["목", "thu", "thursday"]),
                words(&["금", "fri", "friday"]),
                words(&["토", "sat", "saturday"]),
            ],
            every_day: words(&["매일", "daily", "every day"]),
            weekday_suffixes: words(&["요일"]),
            day_of_month_suffix: "일".to_string(),
            event_prefixes: words(&["요새전", "성채전", "Fortress", "Citadel"]),
            citadel_markers: words(&["성채", "citadel"]),
            fortress_label: "요새전".to_string(),
            citadel_label: "성채전".to_string(),
            team_words: words(&["곰", "팀", "군", "team", "squad"]),
            noise_words: words(&["출격", "귀환", "시작", "종료"]),
        }
    }
}

impl Vocabulary {
    /// Every day token, longest first so regex alternation prefers "monday" over "mon".
    pub fn day_tokens(&self) -> Vec<(&str, DayToken)> {
        let mut tokens: Vec<(&str, DayToken)> = self
            .every_day
            .iter()
            .map(|t| (t.as_str(), DayToken::EveryDay))
            .chain(WEEKDAYS.iter().zip(self.weekdays.iter()).flat_map(|(day, list)| {
                list.iter().map(move |t| (t.as_str(), DayToken::Weekday(*day)))
            }))
            .filter(|(t, _)| !t.trim().is_empty())
            .collect();
        tokens.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        tokens
    }

    /// Case-insensitive lookup table from token to day.
    pub fn day_lookup(&self) -> HashMap<String, DayToken> {
        self.day_tokens()
            .into_iter()
            .map(|(t, day)| (t.to_lowercase(), day))
            .collect()
    }

    /// Label used when formatting a weekday.
    pub fn weekday_label(&self, day: Weekday) -> &str {
        let idx = day.num_days_from_sunday() as usize;
        self.weekdays[idx].first().map(String::as_str).unwrap_or("")
    }

    /// Regex alternation matching any day token.
    pub fn day_pattern(&self) -> String {
        alternation(self.day_tokens().into_iter().map(|(t, _)| t))
    }

    /// Regex fragment for an optional weekday suffix.
    pub fn suffix_pattern(&self) -> String {
        if self.weekday_suffixes.is_empty() {
            String::new()
        } else {
            format!("(?:{})?", alternation(self.weekday_suffixes.iter().map(String::as_str)))
        }
    }

    pub fn event_prefix_pattern(&self) -> String {
        alternation(self.event_prefixes.iter().map(String::as_str))
    }
}

/// Case-insensitive regex alternation of escaped literals, longest first.
pub fn alternation<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let mut items: Vec<&str> = items.filter(|t| !t.is_empty()).collect();
    items.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    items.dedup();
    if items.is_empty() {
        // Matches nothing.
        return r"(?:\b\B)".to_string();
    }
    let body = items.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    format!("(?i:{})", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let vocab = Vocabulary::default();
        let lookup = vocab.day_lookup();
        assert_eq!(lookup.get("화"), Some(&DayToken::Weekday(Weekday::Tue)));
        assert_eq!(lookup.get("monday"), Some(&DayToken::Weekday(Weekday::Mon)));
        assert_eq!(lookup.get("매일"), Some(&DayToken::EveryDay));
    }

    #[test]
    fn longer_tokens_come_first() {
        let vocab = Vocabulary::default();
        let tokens = vocab.day_tokens();
        let monday = tokens.iter().position(|(t, _)| *t == "monday").unwrap();
        let mon = tokens.iter().position(|(t, _)| *t == "mon").unwrap();
        assert!(monday < mon);
    }

    #[test]
    fn weekday_label_uses_first_token() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.weekday_label(Weekday::Fri), "금");
    }

    #[test]
    fn vocabulary_can_be_partially_overridden_from_json() {
        let vocab: Vocabulary = serde_json::from_str(r#"{"every_day": ["täglich"]}"#).unwrap();
        assert_eq!(vocab.every_day, vec!["täglich".to_string()]);
        assert_eq!(vocab.weekday_label(Weekday::Mon), "월");
    }
}
