//! Recurrence rule parsing
//!
//! Rules are `KEY=VALUE` segments joined by `;`, e.g.
//! `FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20261231`. Only `FREQ`, `BYDAY` and
//! `UNTIL` are interpreted; other keys are ignored.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use std::collections::HashMap;
use std::str::FromStr;
use syllabus_util::CalendarBasis;
use thiserror::Error;

/// Rule parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Malformed UNTIL value '{0}': expected YYYYMMDD")]
    MalformedUntil(String),

    #[error("Unknown weekday code '{0}' in BYDAY")]
    InvalidWeekday(String),
}

/// Recurrence frequency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    /// Anything else; produces no occurrences
    Unsupported(String),
}

impl Frequency {
    fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            _ => Frequency::Unsupported(value.to_string()),
        }
    }
}

/// A parsed recurrence rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    /// None when the rule has no FREQ segment
    pub freq: Option<Frequency>,
    /// Target weekdays in listing order, without duplicates. Empty means
    /// "the anchor's weekday" for weekly rules.
    pub by_day: Vec<Weekday>,
    /// Last calendar date of the series, inclusive
    pub until: Option<NaiveDate>,
}

impl ParsedRule {
    /// Parse a rule string.
    ///
    /// Malformed `UNTIL` values and unknown `BYDAY` codes are rejected.
    /// A missing or unsupported `FREQ` is not an error.
    pub fn parse(rule: &str) -> Result<Self, RuleError> {
        let parts = rule_parts(rule);

        let freq = parts.get("FREQ").map(|v| Frequency::parse(v));

        let by_day = match parts.get("BYDAY") {
            Some(value) => parse_by_day(value)?,
            None => Vec::new(),
        };

        let until = parts.get("UNTIL").map(|v| parse_until(v)).transpose()?;

        Ok(Self { freq, by_day, until })
    }

    /// The instant the rule stops producing occurrences: 23:59:59 on the
    /// `UNTIL` date in `basis`.
    pub fn until_instant(&self, basis: CalendarBasis) -> Option<DateTime<Utc>> {
        self.until.and_then(|date| basis.end_of_day(date))
    }
}

impl FromStr for ParsedRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split a rule string into its raw `KEY -> VALUE` segments.
///
/// Keys are upper-cased; values are trimmed but otherwise untouched.
/// Segments without `=` and empty segments are dropped. A repeated key keeps
/// its last value.
pub fn rule_parts(rule: &str) -> HashMap<String, String> {
    rule.split(';')
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_ascii_uppercase(), value.trim().to_string()))
        })
        .collect()
}

/// Parse a two-letter weekday code (`MO`..`SU`)
pub fn parse_weekday_code(code: &str) -> Result<Weekday, RuleError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        _ => Err(RuleError::InvalidWeekday(code.trim().to_string())),
    }
}

fn parse_by_day(value: &str) -> Result<Vec<Weekday>, RuleError> {
    let mut days = Vec::new();
    for code in value.split(',').filter(|c| !c.trim().is_empty()) {
        let day = parse_weekday_code(code)?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

fn parse_until(value: &str) -> Result<NaiveDate, RuleError> {
    let malformed = || RuleError::MalformedUntil(value.to_string());

    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| malformed())
}
