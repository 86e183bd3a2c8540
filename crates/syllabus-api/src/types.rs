//! Session and occurrence types

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use syllabus_util::{LessonId, SessionId};
use thiserror::Error;

/// A stored session, possibly carrying a recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTemplate {
    pub id: SessionId,
    pub title: String,
    #[serde(default)]
    pub lesson_id: Option<LessonId>,
    /// Anchor start of the series
    pub start_time: DateTime<Utc>,
    /// Anchor end. None means occurrences have no defined end.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recurring: bool,
    /// `FREQ=...;BYDAY=...;UNTIL=...`, only meaningful when `is_recurring`
    #[serde(default)]
    pub recurrence_rule: Option<String>,
    /// Calendar dates on which no occurrence is produced
    #[serde(default)]
    pub excluded_dates: BTreeSet<NaiveDate>,
}

impl SessionTemplate {
    /// A one-off session
    pub fn single(
        id: impl Into<SessionId>,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            lesson_id: None,
            start_time,
            end_time,
            is_recurring: false,
            recurrence_rule: None,
            excluded_dates: BTreeSet::new(),
        }
    }

    /// A recurring session following `rule`
    pub fn recurring(
        id: impl Into<SessionId>,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            is_recurring: true,
            recurrence_rule: Some(rule.into()),
            ..Self::single(id, title, start_time, end_time)
        }
    }

    pub fn with_excluded_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.excluded_dates.extend(dates);
        self
    }

    pub fn with_lesson(mut self, lesson_id: impl Into<LessonId>) -> Self {
        self.lesson_id = Some(lesson_id.into());
        self
    }

    /// The rule to expand, if this template should be expanded at all.
    /// Blank rules count as absent.
    pub fn active_rule(&self) -> Option<&str> {
        if !self.is_recurring {
            return None;
        }
        self.recurrence_rule
            .as_deref()
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
    }

    /// Anchor duration, if the template has an end time
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end_time.map(|end| end - self.start_time)
    }

    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        self.excluded_dates.contains(&date)
    }
}

/// One entry of a calendar listing.
///
/// Carries every field of its session with `start_time`/`end_time`
/// overridden. `synthetic` is false only when the stored template itself is
/// returned (non-recurring pass-through or the anchor fallback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(flatten)]
    pub session: SessionTemplate,
    pub synthetic: bool,
}

impl Occurrence {
    /// The stored template, unchanged
    pub fn original(session: SessionTemplate) -> Self {
        Self {
            session,
            synthetic: false,
        }
    }

    /// A computed instance of `template` starting at `start_time`
    pub fn generated(template: &SessionTemplate, start_time: DateTime<Utc>) -> Self {
        let end_time = template.duration().map(|d| start_time + d);
        Self {
            session: SessionTemplate {
                start_time,
                end_time,
                ..template.clone()
            },
            synthetic: true,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.session.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.session.end_time
    }
}

/// How occurrences of a weekly rule are ordered within a week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceOrder {
    /// Week by week, and within a week in the order BYDAY lists the days
    #[default]
    Generated,
    /// Strictly ascending by start instant
    Chronological,
}

impl std::str::FromStr for OccurrenceOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generated" => Ok(OccurrenceOrder::Generated),
            "chronological" => Ok(OccurrenceOrder::Chronological),
            other => Err(format!("Unknown occurrence order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Range start {start} is after range end {end}")]
pub struct InvertedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Inclusive query window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    ///
    /// The engine itself does not check ordering; callers that accept ranges
    /// from users go through here.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvertedRange> {
        if start > end {
            return Err(InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}
