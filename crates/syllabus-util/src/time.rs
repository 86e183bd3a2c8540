//! Time utilities for syllabus
//!
//! Every calendar computation (day boundaries, weekdays, date keys) happens in
//! an explicit [`CalendarBasis`]. Instants are stored and exchanged as UTC.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `SYLLABUS_MOCK_TIME` environment variable overrides
//! the wall clock returned by [`now`]. Format: `YYYY-MM-DD HH:MM:SS`, read in
//! the process-local zone.
//!
//! ```bash
//! SYLLABUS_MOCK_TIME="2026-02-02 08:00:00" syllabus occurrences
//! ```

use chrono::{
    DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::SyllabusError;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "SYLLABUS_MOCK_TIME";

/// Format accepted for mock time and for naive config timestamps
pub const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of calendar date keys (excluded dates, CLI ranges)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Offset between mock time and real time at process start.
static MOCK_TIME_OFFSET: OnceLock<Option<TimeDelta>> = OnceLock::new();

fn get_mock_time_offset() -> Option<TimeDelta> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(&mock_time_str, NAIVE_TIMESTAMP_FORMAT)
            else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    expected_format = NAIVE_TIMESTAMP_FORMAT,
                    "Invalid mock time format"
                );
                return None;
            };
            let Some(mock_dt) = Local.from_local_datetime(&naive_dt).earliest() else {
                tracing::warn!(
                    mock_time = %mock_time_str,
                    "Failed to convert mock time to local timezone"
                );
                return None;
            };
            let offset = mock_dt.with_timezone(&Utc).signed_duration_since(Utc::now());
            tracing::info!(
                mock_time = %mock_time_str,
                offset_secs = offset.num_seconds(),
                "Mock time enabled"
            );
            Some(offset)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Current wall-clock instant, respecting mock time in debug builds.
pub fn now() -> DateTime<Utc> {
    let real_now = Utc::now();
    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// The calendar in which dates, weekdays and midnights are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CalendarBasis {
    /// Whatever zone the process runs in
    #[default]
    Local,
    /// A named IANA zone
    Zone(Tz),
}

impl CalendarBasis {
    /// Calendar date of `instant` in this basis
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            CalendarBasis::Local => instant.with_timezone(&Local).date_naive(),
            CalendarBasis::Zone(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// Instant of a wall-clock time in this basis
    pub fn resolve(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            CalendarBasis::Local => resolve_local(&Local, naive).map(|dt| dt.with_timezone(&Utc)),
            CalendarBasis::Zone(tz) => resolve_local(tz, naive).map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Local midnight starting `date`
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.resolve(date.and_time(chrono::NaiveTime::MIN))
    }

    /// Last second of `date` (23:59:59)
    pub fn end_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        date.and_hms_opt(23, 59, 59).and_then(|naive| self.resolve(naive))
    }
}

impl FromStr for CalendarBasis {
    type Err = SyllabusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            return Ok(CalendarBasis::Local);
        }
        s.parse::<Tz>()
            .map(CalendarBasis::Zone)
            .map_err(|_| SyllabusError::UnknownTimezone(s.to_string()))
    }
}

impl TryFrom<String> for CalendarBasis {
    type Error = SyllabusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CalendarBasis> for String {
    fn from(basis: CalendarBasis) -> Self {
        basis.to_string()
    }
}

impl fmt::Display for CalendarBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarBasis::Local => write!(f, "local"),
            CalendarBasis::Zone(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Map a wall-clock time to an instant in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// DST gap are pushed forward by one hour, matching how most calendar UIs
/// render them.
pub fn resolve_local<Tz2: TimeZone>(tz: &Tz2, naive: NaiveDateTime) -> Option<DateTime<Tz2>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest(),
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(s: &str) -> Result<NaiveDate, SyllabusError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| SyllabusError::invalid_date(s))
}

/// Parse a timestamp given either as RFC 3339 or as a naive
/// `YYYY-MM-DD HH:MM[:SS]` (also with a `T` separator) in `basis`.
pub fn parse_timestamp(s: &str, basis: CalendarBasis) -> Result<DateTime<Utc>, SyllabusError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| {
            SyllabusError::invalid_timestamp(s, "expected RFC 3339 or YYYY-MM-DD HH:MM[:SS]")
        })?;

    basis
        .resolve(naive)
        .ok_or_else(|| SyllabusError::invalid_timestamp(s, "does not exist in the calendar zone"))
}

/// Format an instant as wall-clock date and time in `basis`.
pub fn format_datetime_full(instant: DateTime<Utc>, basis: CalendarBasis) -> String {
    match basis {
        CalendarBasis::Local => instant
            .with_timezone(&Local)
            .format(NAIVE_TIMESTAMP_FORMAT)
            .to_string(),
        CalendarBasis::Zone(tz) => instant
            .with_timezone(&tz)
            .format(NAIVE_TIMESTAMP_FORMAT)
            .to_string(),
    }
}

/// Format a duration as `1h 30m`, `45m` or `20s`.
pub fn format_duration(d: TimeDelta) -> String {
    let total_secs = d.num_seconds().max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 && minutes > 0 {
        format!("{}h {}m", hours, minutes)
    } else if hours > 0 {
        format!("{}h", hours)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn utc() -> CalendarBasis {
        CalendarBasis::Zone(chrono_tz::UTC)
    }

    #[test]
    fn test_calendar_basis_parse() {
        assert_eq!("local".parse::<CalendarBasis>().unwrap(), CalendarBasis::Local);
        assert_eq!("LOCAL".parse::<CalendarBasis>().unwrap(), CalendarBasis::Local);
        assert_eq!(
            "Europe/Berlin".parse::<CalendarBasis>().unwrap(),
            CalendarBasis::Zone(chrono_tz::Europe::Berlin)
        );
        assert!(matches!(
            "Mars/Olympus".parse::<CalendarBasis>(),
            Err(SyllabusError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn test_calendar_basis_display_roundtrip() {
        let basis = CalendarBasis::Zone(chrono_tz::America::New_York);
        assert_eq!(basis.to_string(), "America/New_York");
        assert_eq!(basis.to_string().parse::<CalendarBasis>().unwrap(), basis);
    }

    #[test]
    fn test_date_of_uses_basis() {
        // 2026-01-01 03:00 UTC is still Dec 31 in New York
        let instant = Utc.with_ymd_and_hms(2026, 1, 1, 3, 0, 0).unwrap();
        assert_eq!(utc().date_of(instant), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let ny = CalendarBasis::Zone(chrono_tz::America::New_York);
        assert_eq!(ny.date_of(instant), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_end_of_day() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 4).unwrap();
        let end = utc().end_of_day(date).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 4, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_resolve_local_dst_gap_moves_forward() {
        // 02:30 does not exist in New York on 2026-03-08
        let naive = NaiveDate::from_ymd_opt(2026, 3, 8)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let dt = resolve_local(&chrono_tz::America::New_York, naive).unwrap();
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_resolve_local_ambiguous_takes_earliest() {
        // 01:30 happens twice in New York on 2026-11-01
        let naive = NaiveDate::from_ymd_opt(2026, 11, 1)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let dt = resolve_local(&chrono_tz::America::New_York, naive).unwrap();
        assert_eq!(dt.with_timezone(&Utc).hour(), 5);
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2026-01-02").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2026, 1, 2));

        assert!(parse_date("2026/01/02").is_err());
        assert!(parse_date("20260102").is_err());
        assert!(parse_date("2026-02-30").is_err());
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 2, 18, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-02-02T18:00:00Z", utc()).unwrap(), expected);
        assert_eq!(parse_timestamp("2026-02-02 18:00", utc()).unwrap(), expected);
        assert_eq!(parse_timestamp("2026-02-02 18:00:00", utc()).unwrap(), expected);
        assert_eq!(parse_timestamp("2026-02-02T18:00", utc()).unwrap(), expected);

        // Naive timestamps are read in the calendar zone
        let berlin = CalendarBasis::Zone(chrono_tz::Europe::Berlin);
        assert_eq!(
            parse_timestamp("2026-02-02 19:00", berlin).unwrap(),
            expected
        );

        assert!(parse_timestamp("next tuesday", utc()).is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::seconds(30)), "30s");
        assert_eq!(format_duration(TimeDelta::minutes(45)), "45m");
        assert_eq!(format_duration(TimeDelta::minutes(90)), "1h 30m");
        assert_eq!(format_duration(TimeDelta::hours(2)), "2h");
    }

    #[test]
    fn test_format_datetime_full() {
        let instant = Utc.with_ymd_and_hms(2026, 2, 2, 18, 0, 0).unwrap();
        assert_eq!(format_datetime_full(instant, utc()), "2026-02-02 18:00:00");
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_mock_time_env_var_name() {
        assert_eq!(MOCK_TIME_ENV_VAR, "SYLLABUS_MOCK_TIME");
        let _ = is_mock_time_active();
    }
}
