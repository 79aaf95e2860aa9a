//! Splits compound schedule entries into independently scheduled sub-entries.

use regex::Regex;
use tracing::debug;

use super::grammar::{split_on_slash, CLOCK};
use super::types::{Recurrence, ScheduleEntry, SubEntry};
use super::vocab::{alternation, Vocabulary};

/// Event families whose entries carry more than one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFamily {
    BearHunt,
    Foundry,
    Canyon,
    /// Fortress and citadel battles share one entry.
    Fortress,
}

const FAMILY_MARKERS: [(TrackFamily, &[&str]); 4] = [
    (TrackFamily::BearHunt, &["bear"]),
    (TrackFamily::Foundry, &["foundry", "weapon_factory", "weaponfactory"]),
    (TrackFamily::Canyon, &["canyon"]),
    (TrackFamily::Fortress, &["fortress", "citadel"]),
];

impl TrackFamily {
    /// Family of an entry, judged by its id.
    pub fn of(id: &str) -> Option<Self> {
        let id = id.to_lowercase();
        FAMILY_MARKERS
            .iter()
            .find(|(_, markers)| markers.iter().any(|marker| id.contains(marker)))
            .map(|(family, _)| *family)
    }
}

#[derive(Debug, Clone)]
pub struct Expander {
    noise: Regex,
    team_words: Regex,
    citadel: Regex,
    event_prefix: Regex,
    fortress_label: String,
    citadel_label: String,
}

impl Expander {
    pub fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        Ok(Self {
            noise: Regex::new(&alternation(vocab.noise_words.iter().map(String::as_str)))?,
            team_words: Regex::new(&alternation(vocab.team_words.iter().map(String::as_str)))?,
            citadel: Regex::new(&alternation(vocab.citadel_markers.iter().map(String::as_str)))?,
            event_prefix: Regex::new(&format!(r"^\W*{}\s*[:：]?\s*", vocab.event_prefix_pattern()))?,
            fortress_label: vocab.fortress_label.clone(),
            citadel_label: vocab.citadel_label.clone(),
        })
    }

    pub fn expand(&self, entry: &ScheduleEntry) -> Vec<SubEntry> {
        match TrackFamily::of(&entry.id) {
            Some(TrackFamily::Fortress) => self.split_fortress(entry),
            Some(family) => self.split_tracks(entry, family),
            None => vec![unsplit(entry)],
        }
    }

    /// Positional split of `day`/`time` on `/`: part N of each field belongs to track N+1.
    fn split_tracks(&self, entry: &ScheduleEntry, family: TrackFamily) -> Vec<SubEntry> {
        let days = split_on_slash(&entry.day);
        let times = split_on_slash(&entry.time);
        let count = days.len().max(times.len()).max(1);

        (0..count)
            .map(|idx| {
                let (explicit, body) = split_label(pick(&times, idx));
                let track = explicit
                    .and_then(|label| self.normalize_label(label))
                    .or_else(|| (count > 1).then(|| (idx + 1).to_string()));
                let recurrence = match idx {
                    0 => entry.primary_recurrence(),
                    1 => entry.secondary_recurrence(),
                    _ => Recurrence::default(),
                };
                SubEntry {
                    id: format!("{}_team{}", entry.id, idx + 1),
                    parent_id: entry.id.clone(),
                    title: title_of(entry),
                    category: entry.category.clone(),
                    day: pick(&days, idx).to_string(),
                    time: self.strip_noise(body),
                    track,
                    recurrence,
                    is_bear_hunt: family == TrackFamily::BearHunt,
                }
            })
            .collect()
    }

    /// Routes every time segment into the fortress or citadel bucket.
    fn split_fortress(&self, entry: &ScheduleEntry) -> Vec<SubEntry> {
        let segments: Vec<&str> = split_on_slash(&entry.time)
            .into_iter()
            .flat_map(|part| part.split([',', '，']))
            .map(str::trim)
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();
        let (citadel, fortress): (Vec<&str>, Vec<&str>) =
            segments.into_iter().partition(|segment| self.citadel.is_match(segment));

        let buckets = [
            ("fortress", &self.fortress_label, fortress),
            ("citadel", &self.citadel_label, citadel),
        ];
        let subs: Vec<SubEntry> = buckets
            .into_iter()
            .filter(|(_, _, segments)| !segments.is_empty())
            .map(|(suffix, label, segments)| SubEntry {
                id: format!("{}_{}", entry.id, suffix),
                parent_id: entry.id.clone(),
                title: title_of(entry),
                category: entry.category.clone(),
                day: String::new(),
                time: segments
                    .iter()
                    .map(|segment| self.event_prefix.replace(segment, "").trim().to_string())
                    .filter(|segment| !segment.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
                track: Some(label.clone()),
                recurrence: entry.primary_recurrence(),
                is_bear_hunt: false,
            })
            .collect();

        if subs.is_empty() {
            debug!(id = %entry.id, "no fortress or citadel segments, keeping entry whole");
            return vec![unsplit(entry)];
        }
        subs
    }

    /// "1군" -> "1"; a label that is only team words falls back to the position.
    fn normalize_label(&self, label: &str) -> Option<String> {
        let cleaned = self.team_words.replace_all(label, "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.to_string())
        }
    }

    /// Drops action words ("출격", "귀환") from each comma or pipe segment.
    fn strip_noise(&self, time: &str) -> String {
        time.split([',', '|'])
            .map(|segment| {
                let stripped = self.noise.replace_all(segment, "");
                stripped.split_whitespace().collect::<Vec<_>>().join(" ")
            })
            .filter(|segment| !segment.is_empty() && segment != ".")
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn title_of(entry: &ScheduleEntry) -> String {
    entry
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(&entry.id)
        .to_string()
}

fn unsplit(entry: &ScheduleEntry) -> SubEntry {
    SubEntry {
        id: entry.id.clone(),
        parent_id: entry.id.clone(),
        title: title_of(entry),
        category: entry.category.clone(),
        day: entry.day.clone(),
        time: entry.time.clone(),
        track: None,
        recurrence: entry.primary_recurrence(),
        is_bear_hunt: TrackFamily::of(&entry.id) == Some(TrackFamily::BearHunt),
    }
}

/// Part `idx`, or the first part when the field has fewer parts.
fn pick<'a>(parts: &[&'a str], idx: usize) -> &'a str {
    parts.get(idx).or_else(|| parts.first()).copied().unwrap_or("")
}

/// Separates a leading `label:` from a track, but only when the colon precedes every clock time.
fn split_label(segment: &str) -> (Option<&str>, &str) {
    let colon = segment.char_indices().find(|(_, c)| *c == ':' || *c == '：');
    let Some((at, colon)) = colon else {
        return (None, segment.trim());
    };
    let before_clock = CLOCK.find(segment).map_or(true, |clock| at < clock.start());
    let label = segment[..at].trim();
    if before_clock && !label.is_empty() {
        (Some(label), segment[at + colon.len_utf8()..].trim())
    } else {
        (None, segment.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expander() -> Expander {
        Expander::new(&Vocabulary::default()).unwrap()
    }

    fn entry(id: &str, day: &str, time: &str) -> ScheduleEntry {
        ScheduleEntry {
            id: id.to_string(),
            title: Some("Event".to_string()),
            day: day.to_string(),
            time: time.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn families_are_detected_from_id() {
        assert_eq!(TrackFamily::of("bear_hunt"), Some(TrackFamily::BearHunt));
        assert_eq!(TrackFamily::of("Weapon_Factory"), Some(TrackFamily::Foundry));
        assert_eq!(TrackFamily::of("canyon_clash"), Some(TrackFamily::Canyon));
        assert_eq!(TrackFamily::of("fortress_battle"), Some(TrackFamily::Fortress));
        assert_eq!(TrackFamily::of("kvk"), None);
    }

    #[test]
    fn ordinary_entry_passes_through() {
        let subs = expander().expand(&entry("kvk", "토", "22:00"));
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "kvk");
        assert_eq!(subs[0].track, None);
        assert_eq!(subs[0].descriptor(), "토 22:00");
    }

    #[test]
    fn bear_hunt_splits_positionally_with_labels() {
        let subs = expander().expand(&entry("bear_hunt", "월 / 목", "1군: 22:00 / 2군: 23:00"));
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].id, "bear_hunt_team1");
        assert_eq!(subs[0].descriptor(), "월 22:00");
        assert_eq!(subs[0].track.as_deref(), Some("1"));
        assert_eq!(subs[1].descriptor(), "목 23:00");
        assert_eq!(subs[1].track.as_deref(), Some("2"));
        assert!(subs.iter().all(|s| s.is_bear_hunt && s.parent_id == "bear_hunt"));
    }

    #[test]
    fn unspaced_clock_slash_splits_tracks() {
        let subs = expander().expand(&entry("bear_hunt", "월 / 화", "22:00/23:00"));
        let fields: Vec<(&str, &str)> = subs.iter().map(|s| (s.day.as_str(), s.time.as_str())).collect();
        assert_eq!(fields, vec![("월", "22:00"), ("화", "23:00")]);
    }

    #[test]
    fn missing_part_falls_back_to_first() {
        let subs = expander().expand(&entry("foundry", "일", "12:00 / 20:00"));
        assert_eq!(subs[0].descriptor(), "일 12:00");
        assert_eq!(subs[1].descriptor(), "일 20:00");
        assert_eq!(subs[1].track.as_deref(), Some("2"));
    }

    #[test]
    fn secondary_recurrence_follows_second_track() {
        let mut canyon = entry("canyon", "토 / 일", "21:00 / 21:00");
        canyon.is_recurring2 = Some(true);
        canyon.recurrence_value2 = Some(2);
        let subs = expander().expand(&canyon);
        assert_eq!(subs[0].recurrence, Recurrence::default());
        assert_eq!(subs[1].recurrence.value, Some(2));
    }

    #[test]
    fn single_track_has_no_label_and_drops_noise() {
        let subs = expander().expand(&entry("bear_hunt", "화", "22:00 출격"));
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].track, None);
        assert_eq!(subs[0].time, "22:00");
    }

    #[test]
    fn fortress_segments_are_bucketed() {
        let subs = expander().expand(&entry(
            "fortress",
            "",
            "요새전: 요새1 토(22:00), 요새2 토(23:00) / 성채전: 성채 일(22:00)",
        ));
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].id, "fortress_fortress");
        assert_eq!(subs[0].track.as_deref(), Some("요새전"));
        assert_eq!(subs[0].time, "요새1 토(22:00), 요새2 토(23:00)");
        assert_eq!(subs[1].id, "fortress_citadel");
        assert_eq!(subs[1].track.as_deref(), Some("성채전"));
        assert_eq!(subs[1].time, "성채 일(22:00)");
    }

    #[test]
    fn empty_fortress_entry_is_kept_whole() {
        let subs = expander().expand(&entry("fortress", "토", "."));
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "fortress");
    }

    #[test]
    fn colon_after_clock_is_not_a_label() {
        assert_eq!(split_label("22:00"), (None, "22:00"));
        assert_eq!(split_label("A조: 21:30"), (Some("A조"), "21:30"));
    }
}
