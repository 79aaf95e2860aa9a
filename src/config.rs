use std::env;
use std::path::PathBuf;

use crate::error::TimelineError;
use crate::parser::load_vocabulary;
use crate::timeline::{TimelineOptions, TimezoneMode, Vocabulary};

pub const DEFAULT_DATA_PATH: &str = "data/schedule.csv";
pub const DEFAULT_PORT: u16 = 8080;

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Runtime settings for the CLI and web front doors.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Zone used for the window boundary and time text.
    pub display: TimezoneMode,
    /// Zone the schedule descriptors were written in.
    pub source: TimezoneMode,
    /// JSON file replacing the default token table.
    pub vocabulary_path: Option<PathBuf>,
    pub data_path: PathBuf,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: TimezoneMode::Local,
            source: TimezoneMode::Local,
            vocabulary_path: None,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Reads `TIMELINE_TZ`, `TIMELINE_SOURCE_TZ`, `TIMELINE_VOCAB`, `TIMELINE_DATA` and `PORT`.
    pub fn from_env() -> Result<Self, TimelineError> {
        Self::from_lookup(env_opt)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, TimelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            display: match lookup("TIMELINE_TZ") {
                Some(value) => value.parse()?,
                None => defaults.display,
            },
            source: match lookup("TIMELINE_SOURCE_TZ") {
                Some(value) => value.parse()?,
                None => defaults.source,
            },
            vocabulary_path: lookup("TIMELINE_VOCAB").map(PathBuf::from),
            data_path: lookup("TIMELINE_DATA")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        })
    }

    /// Engine options, loading the vocabulary file when one is configured.
    pub fn timeline_options(&self) -> Result<TimelineOptions, TimelineError> {
        let vocabulary = match &self.vocabulary_path {
            Some(path) => load_vocabulary(path)?,
            None => Vocabulary::default(),
        };
        Ok(TimelineOptions {
            source: self.source,
            vocabulary,
        })
    }
}
