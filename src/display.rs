use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;

use crate::error::TimelineError;
use crate::timeline::{format_instant, now_marker_percent, PositionedBar, TimeWindow, TimelineRow, TimezoneMode, Vocabulary};

/// Formats a row heading with its category tag
pub fn format_row_title(row: &TimelineRow) -> String {
    match &row.category {
        Some(category) if !category.is_empty() => format!("[{}] {}", category, row.title),
        _ => row.title.clone(),
    }
}

/// One line per bar: time text, position on the window, label.
pub fn format_bar(bar: &PositionedBar) -> String {
    let mut line = format!(
        "{} (left {:.1}%, width {:.1}%)",
        bar.time_text, bar.left_percent, bar.width_percent
    );
    if bar.is_weekly {
        line.push_str(" weekly");
    }
    if let Some(label) = &bar.label {
        line.push_str(" - ");
        line.push_str(label);
    }
    line
}

fn header(window: &TimeWindow, now: DateTime<Utc>, display: TimezoneMode, vocab: &Vocabulary) -> String {
    format!(
        "=== Timeline {} ~ {} ({}) | now at {:.1}% ===",
        format_instant(window.start, display, vocab),
        format_instant(window.end, display, vocab),
        display,
        now_marker_percent(now, window)
    )
}

/// Prints every row and its bars
pub fn print_timeline(
    rows: &[TimelineRow],
    window: &TimeWindow,
    now: DateTime<Utc>,
    display: TimezoneMode,
    vocab: &Vocabulary,
) {
    println!("\n{}", header(window, now, display, vocab));
    if rows.is_empty() {
        println!("No events in this window.");
        return;
    }
    for row in rows {
        println!("\n{}", format_row_title(row));
        for bar in &row.bars {
            println!("  {}", format_bar(bar));
        }
    }
}

/// Writes the timeline to a text file in the same layout as [`print_timeline`]
pub fn write_timeline_to_file(
    rows: &[TimelineRow],
    window: &TimeWindow,
    now: DateTime<Utc>,
    display: TimezoneMode,
    vocab: &Vocabulary,
    filename: &str,
) -> Result<(), TimelineError> {
    let mut file = File::create(filename)?;
    writeln!(file, "{}", header(window, now, display, vocab))?;
    for row in rows {
        writeln!(file, "{}", format_row_title(row))?;
        for bar in &row.bars {
            writeln!(file, "  {}", format_bar(bar))?;
        }
    }
    Ok(())
}
