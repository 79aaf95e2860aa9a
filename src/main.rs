use std::path::PathBuf;

use chrono::Utc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use event_timeline::config::Config;
use event_timeline::display::{print_timeline, write_timeline_to_file};
use event_timeline::parser::load_entries;
use event_timeline::web::{self, AppState};
use event_timeline::Timeline;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let timeline = Timeline::new(config.timeline_options()?)?;

    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args.get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(config.port);
        let entries = if config.data_path.exists() {
            load_entries(&config.data_path)?
        } else {
            warn!(path = %config.data_path.display(), "schedule file not found, starting empty");
            Vec::new()
        };

        println!("Starting web server on port {}...", port);
        println!("Access the timeline at http://localhost:{}/api/timeline", port);

        web::start_server(port, AppState::new(entries, timeline, config.display)).await?;
        return Ok(());
    }

    // CLI mode: an optional path overrides TIMELINE_DATA
    let data_path = args.get(1).map(PathBuf::from).unwrap_or_else(|| config.data_path.clone());

    println!("Loading schedule from {}...", data_path.display());
    let entries = load_entries(&data_path)?;
    println!("Loaded {} schedule entries (duplicate ids merged)", entries.len());

    let now = Utc::now();
    let window = timeline.window(now, config.display);
    let rows = timeline.compute(&entries, now, config.display);

    print_timeline(&rows, &window, now, config.display, timeline.vocabulary());

    write_timeline_to_file(&rows, &window, now, config.display, timeline.vocabulary(), "timeline.txt")?;
    println!("\nTimeline saved to timeline.txt");

    Ok(())
}
