//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-wide settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Session templates to seed the store with
    #[serde(default)]
    pub sessions: Vec<RawSession>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the session store
    pub data_dir: Option<PathBuf>,

    /// Calendar zone: "local" or an IANA name such as "Europe/Berlin"
    pub timezone: Option<String>,

    /// Per-session occurrence cap; 0 disables it
    pub max_occurrences: Option<usize>,

    /// "generated" or "chronological"
    pub occurrence_order: Option<String>,

    /// Listing window used when no range is given
    pub default_window_days: Option<u32>,
}

/// Raw session definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSession {
    /// Unique stable ID
    pub id: String,

    /// Display title
    pub title: String,

    /// Lesson the session delivers
    pub lesson: Option<String>,

    /// Anchor start: RFC 3339 or "YYYY-MM-DD HH:MM[:SS]" in the calendar zone
    pub start: String,

    /// Anchor end, same formats as `start`
    pub end: Option<String>,

    /// Recurrence rule, e.g. "FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20261231"
    pub recurrence: Option<String>,

    /// Defaults to whether `recurrence` is present
    pub is_recurring: Option<bool>,

    /// "YYYY-MM-DD" dates without an occurrence
    #[serde(default)]
    pub excluded_dates: Vec<String>,
}
