//! Validated settings structures

use chrono::TimeDelta;
use std::path::PathBuf;
use syllabus_api::{OccurrenceOrder, SessionTemplate};
use syllabus_core::{ExpandOptions, Expander, DEFAULT_MAX_OCCURRENCES};
use syllabus_util::{
    default_data_dir, parse_date, parse_timestamp, CalendarBasis, LessonId, SessionId,
};

use crate::schema::{RawConfig, RawServiceConfig, RawSession};
use crate::validation::calendar_basis;

/// Listing window used when neither the config nor the caller gives one
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Validated settings ready for use by the store and the engine
#[derive(Debug, Clone)]
pub struct Settings {
    /// Service configuration
    pub service: ServiceConfig,

    /// Seed sessions, in file order
    pub sessions: Vec<SessionTemplate>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let service = ServiceConfig::from_raw(&raw.service);
        let sessions = raw
            .sessions
            .into_iter()
            .filter_map(|s| convert_session(s, service.calendar))
            .collect();

        Self { service, sessions }
    }

    /// Get seed session by ID
    pub fn get_session(&self, id: &SessionId) -> Option<&SessionTemplate> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// An expander configured from the service settings
    pub fn expander(&self) -> Expander {
        Expander::new(self.service.calendar, self.service.expand)
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub calendar: CalendarBasis,
    pub expand: ExpandOptions,
    pub default_window: TimeDelta,
}

impl ServiceConfig {
    fn from_raw(raw: &RawServiceConfig) -> Self {
        // 0 disables the cap, None uses the default
        let max_occurrences = match raw.max_occurrences {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(DEFAULT_MAX_OCCURRENCES),
        };
        let order = raw
            .occurrence_order
            .as_deref()
            .and_then(|o| o.parse::<OccurrenceOrder>().ok())
            .unwrap_or_default();

        Self {
            data_dir: raw.data_dir.clone().unwrap_or_else(default_data_dir),
            calendar: calendar_basis(raw).unwrap_or_default(),
            expand: ExpandOptions {
                max_occurrences,
                order,
            },
            default_window: TimeDelta::days(i64::from(
                raw.default_window_days.unwrap_or(DEFAULT_WINDOW_DAYS),
            )),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(&RawServiceConfig::default())
    }
}

// Conversion helpers

fn convert_session(raw: RawSession, basis: CalendarBasis) -> Option<SessionTemplate> {
    let start_time = parse_timestamp(&raw.start, basis).ok()?;
    let end_time = raw
        .end
        .as_deref()
        .and_then(|end| parse_timestamp(end, basis).ok());
    let excluded_dates = raw
        .excluded_dates
        .iter()
        .filter_map(|d| parse_date(d).ok())
        .collect();

    Some(SessionTemplate {
        id: SessionId::new(raw.id),
        title: raw.title,
        lesson_id: raw.lesson.map(LessonId::new),
        start_time,
        end_time,
        is_recurring: raw.is_recurring.unwrap_or(raw.recurrence.is_some()),
        recurrence_rule: raw.recurrence,
        excluded_dates,
    })
}
