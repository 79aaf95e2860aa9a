use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};

use event_timeline::parser::{load_entries, load_vocabulary};
use event_timeline::{compute_timeline, ScheduleEntry, TimelineOptions, TimezoneMode};

fn data(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(file)
}

fn wednesday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 12, 0, 0).unwrap()
}

fn utc_options() -> TimelineOptions {
    TimelineOptions {
        source: TimezoneMode::Utc,
        ..Default::default()
    }
}

#[test]
fn sample_csv_renders_expected_rows() {
    let entries = load_entries(data("schedule.csv")).unwrap();
    assert_eq!(entries.len(), 10);

    let rows = compute_timeline(&entries, wednesday(), TimezoneMode::Utc, &utc_options()).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    for expected in [
        "bear_hunt_team1",
        "bear_hunt_team2",
        "fortress_battle_fortress",
        "fortress_battle_citadel",
        "kvk",
        "weapon_factory_team1",
        "weapon_factory_team2",
        "canyon_clash_team1",
        "season_event",
        "arena",
        "raid",
    ] {
        assert!(ids.contains(&expected), "{} missing from {:?}", expected, ids);
    }
    assert!(!ids.contains(&"notice"));

    let arena = rows.iter().find(|r| r.id == "arena").unwrap();
    assert_eq!(arena.bars.len(), 7);
    assert_eq!(arena.category.as_deref(), Some("daily"));

    let bear = rows.iter().find(|r| r.id == "bear_hunt_team1").unwrap();
    assert_eq!(bear.bars.len(), 4);
    assert_eq!(bear.title, "곰 사냥 (1)");
}

#[test]
fn sample_json_uses_english_tokens() {
    let entries: Vec<ScheduleEntry> = load_entries(data("schedule.json")).unwrap();
    let rows = compute_timeline(&entries, wednesday(), TimezoneMode::Utc, &utc_options()).unwrap();

    let kvk = rows.iter().find(|r| r.id == "kvk").unwrap();
    assert_eq!(kvk.bars.len(), 1);
    assert!(kvk.bars[0].is_range);

    let keeps = rows.iter().find(|r| r.id == "citadel_war_fortress").unwrap();
    let labels: Vec<_> = keeps.bars.iter().map(|b| b.label.as_deref()).collect();
    assert_eq!(labels, vec![Some("Keep 1"), Some("Keep 2")]);

    let team = rows.iter().find(|r| r.id == "bear_hunt_team1").unwrap();
    assert_eq!(team.track.as_deref(), Some("1"));
}

#[test]
fn vocabulary_file_replaces_token_table() {
    let vocabulary = load_vocabulary(data("vocabulary.en.json")).unwrap();
    assert_eq!(vocabulary.weekday_label(chrono::Weekday::Fri), "Fri");
    let options = TimelineOptions {
        source: TimezoneMode::Utc,
        vocabulary,
    };
    let entries = vec![
        ScheduleEntry {
            id: "english".to_string(),
            day: "Mon".to_string(),
            time: "22:00".to_string(),
            ..Default::default()
        },
        ScheduleEntry {
            id: "korean".to_string(),
            day: "월".to_string(),
            time: "22:00".to_string(),
            ..Default::default()
        },
        ScheduleEntry {
            id: "monthly".to_string(),
            day: String::new(),
            time: "13th 21:00".to_string(),
            ..Default::default()
        },
    ];
    let rows = compute_timeline(&entries, wednesday(), TimezoneMode::Utc, &options).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["english", "monthly"]);
    assert_eq!(rows[0].bars[0].time_text, "9th(Mon) 22:00");
}
