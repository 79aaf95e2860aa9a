use csv::{Reader, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::TimelineError;
use crate::timeline::grammar::parse_date;
use crate::timeline::{RecurrenceUnit, ScheduleEntry, Vocabulary};

/// Lowercased header with separators dropped, so `start_date`, `startDate` and `Start Date` agree.
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn field(record: &StringRecord, col: Option<usize>) -> &str {
    col.and_then(|c| record.get(c)).unwrap_or("").trim()
}

fn optional_text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses a boolean value from various string representations; blank means unset
fn parse_bool(value: &str) -> Option<bool> {
    if value.is_empty() {
        return None;
    }
    let lower = value.to_lowercase();
    Some(lower == "yes" || lower == "true" || lower == "1" || lower == "y")
}

/// Parses a number, returning None if empty or invalid
fn parse_number(value: &str) -> Option<u32> {
    value.parse().ok()
}

fn parse_unit(value: &str) -> Option<RecurrenceUnit> {
    match value.to_lowercase().as_str() {
        "day" | "days" | "d" | "일" => Some(RecurrenceUnit::Day),
        "week" | "weeks" | "w" | "주" => Some(RecurrenceUnit::Week),
        _ => None,
    }
}

fn parse_start_date(value: &str) -> Option<chrono::NaiveDate> {
    parse_date(value, 1970)
        .filter(|(_, explicit_year)| *explicit_year)
        .map(|(date, _)| date)
}

/// Reads schedule entries from CSV with a header row.
///
/// Columns are found by name. A later row with an already seen id replaces the
/// earlier one in place.
pub fn read_entries_csv<R: Read>(mut reader: Reader<R>) -> Result<Vec<ScheduleEntry>, TimelineError> {
    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let id_col = find("id")
        .ok_or_else(|| TimelineError::UnsupportedFormat("CSV has no id column".to_string()))?;
    let title_col = find("title");
    let day_col = find("day");
    let time_col = find("time");
    let category_col = find("category");
    let start_date_col = find("startdate");
    let recurring_col = find("isrecurring");
    let value_col = find("recurrencevalue");
    let unit_col = find("recurrenceunit");
    let start_date2_col = find("startdate2");
    let recurring2_col = find("isrecurring2");
    let value2_col = find("recurrencevalue2");
    let unit2_col = find("recurrenceunit2");

    let mut entries: Vec<ScheduleEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let id = field(&record, Some(id_col));
        if id.is_empty() {
            continue; // Skip rows without an id
        }

        let entry = ScheduleEntry {
            id: id.to_string(),
            title: optional_text(field(&record, title_col)),
            day: field(&record, day_col).to_string(),
            time: field(&record, time_col).to_string(),
            category: optional_text(field(&record, category_col)),
            start_date: parse_start_date(field(&record, start_date_col)),
            is_recurring: parse_bool(field(&record, recurring_col)),
            recurrence_value: parse_number(field(&record, value_col)),
            recurrence_unit: parse_unit(field(&record, unit_col)),
            start_date2: parse_start_date(field(&record, start_date2_col)),
            is_recurring2: parse_bool(field(&record, recurring2_col)),
            recurrence_value2: parse_number(field(&record, value2_col)),
            recurrence_unit2: parse_unit(field(&record, unit2_col)),
        };

        match positions.get(&entry.id) {
            Some(&idx) => entries[idx] = entry,
            None => {
                positions.insert(entry.id.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

pub fn load_entries_csv<P: AsRef<Path>>(csv_path: P) -> Result<Vec<ScheduleEntry>, TimelineError> {
    read_entries_csv(Reader::from_path(csv_path)?)
}

/// CSV body of an upload.
pub fn parse_entries_csv(body: &[u8]) -> Result<Vec<ScheduleEntry>, TimelineError> {
    read_entries_csv(Reader::from_reader(body))
}

pub fn load_entries_json<P: AsRef<Path>>(json_path: P) -> Result<Vec<ScheduleEntry>, TimelineError> {
    let file = File::open(json_path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Loads entries from a `.csv` or `.json` file.
pub fn load_entries<P: AsRef<Path>>(path: P) -> Result<Vec<ScheduleEntry>, TimelineError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("csv") => load_entries_csv(path),
        Some("json") => load_entries_json(path),
        _ => Err(TimelineError::UnsupportedFormat(path.display().to_string())),
    }
}

pub fn load_vocabulary<P: AsRef<Path>>(path: P) -> Result<Vocabulary, TimelineError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reads_columns_by_header_name() {
        let csv = "\
id,title,day,time,category,start_date,is_recurring,recurrence_value,recurrence_unit
bear_hunt,Bear Hunt,월 / 목,22:00 / 23:00,alliance,2026-02-01,yes,2,day
kvk,,토,22:00,,,,,
";
        let entries = parse_entries_csv(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        let bear = &entries[0];
        assert_eq!(bear.title.as_deref(), Some("Bear Hunt"));
        assert_eq!(bear.day, "월 / 목");
        assert_eq!(bear.start_date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(bear.is_recurring, Some(true));
        assert_eq!(bear.recurrence_value, Some(2));
        assert_eq!(bear.recurrence_unit, Some(RecurrenceUnit::Day));
        let kvk = &entries[1];
        assert_eq!(kvk.title, None);
        assert_eq!(kvk.is_recurring, None);
    }

    #[test]
    fn header_spelling_is_flexible() {
        let csv = "ID,Day,Time,startDate\nraid,화,21:00,26.03.01\n";
        let entries = parse_entries_csv(csv.as_bytes()).unwrap();
        assert_eq!(entries[0].id, "raid");
        assert_eq!(entries[0].start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn later_rows_replace_earlier_ones_in_place() {
        let csv = "id,day,time\na,월,10:00\nb,화,11:00\na,수,12:00\n";
        let entries = parse_entries_csv(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[0].day, "수");
        assert_eq!(entries[1].id, "b");
    }

    #[test]
    fn missing_id_column_is_an_error() {
        let err = parse_entries_csv("day,time\n월,10:00\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TimelineError::UnsupportedFormat(_)));
    }

    #[test]
    fn json_entries_use_camel_case() {
        let json = r#"[{"id": "canyon", "day": "토 / 일", "time": "21:00", "isRecurring2": true, "recurrenceValue2": 2, "recurrenceUnit2": "week"}]"#;
        let entries: Vec<ScheduleEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].recurrence_unit2, Some(RecurrenceUnit::Week));
        assert_eq!(entries[0].is_recurring, None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            load_entries("schedule.xlsx"),
            Err(TimelineError::UnsupportedFormat(_))
        ));
    }
}
