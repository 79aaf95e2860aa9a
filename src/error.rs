use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Unsupported schedule file: {0}")]
    UnsupportedFormat(String),
}
