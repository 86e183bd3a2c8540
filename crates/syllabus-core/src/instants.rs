//! Lazy walks over candidate occurrence instants
//!
//! Both walks stop by themselves once they pass their end bound, so they are
//! finite for any finite bound.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc, Weekday};
use syllabus_util::resolve_local;

/// A candidate occurrence: the calendar date it falls on and its start instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
}

/// One candidate per calendar day at a fixed wall-clock time
pub struct DailyInstants<'a, Tz: TimeZone> {
    tz: &'a Tz,
    time: NaiveTime,
    next_date: Option<NaiveDate>,
    end: DateTime<Utc>,
}

impl<'a, Tz: TimeZone> DailyInstants<'a, Tz> {
    /// Walk days from `first_date` at wall-clock `time` until the instant
    /// passes `end`.
    pub fn new(tz: &'a Tz, first_date: NaiveDate, time: NaiveTime, end: DateTime<Utc>) -> Self {
        Self {
            tz,
            time,
            next_date: Some(first_date),
            end,
        }
    }
}

impl<Tz: TimeZone> Iterator for DailyInstants<'_, Tz> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let date = self.next_date?;
            self.next_date = date.succ_opt();

            let Some(local) = resolve_local(self.tz, date.and_time(self.time)) else {
                continue;
            };
            let start = local.with_timezone(&Utc);
            if start > self.end {
                self.next_date = None;
                return None;
            }
            return Some(Candidate { date, start });
        }
    }
}

/// Candidates on the given weekdays, week by week.
///
/// Weeks start on Sunday. Within a week, candidates follow the order of
/// `days`, which need not be calendar order.
pub struct WeeklyInstants<'a, Tz: TimeZone> {
    tz: &'a Tz,
    time: NaiveTime,
    days: Vec<Weekday>,
    week_start: Option<NaiveDate>,
    day_index: usize,
    end: DateTime<Utc>,
}

impl<'a, Tz: TimeZone> WeeklyInstants<'a, Tz> {
    /// Walk the weeks starting with the one containing `first_date`.
    pub fn new(
        tz: &'a Tz,
        first_date: NaiveDate,
        time: NaiveTime,
        days: Vec<Weekday>,
        end: DateTime<Utc>,
    ) -> Self {
        let mut walk = Self {
            tz,
            time,
            days,
            week_start: Some(week_start_of(first_date)),
            day_index: 0,
            end,
        };
        if walk.days.is_empty() {
            walk.week_start = None;
        }
        walk.check_week_bound();
        walk
    }

    /// Stop the walk once the current week starts after `end`.
    fn check_week_bound(&mut self) {
        let Some(week_start) = self.week_start else {
            return;
        };
        let midnight = resolve_local(self.tz, week_start.and_time(NaiveTime::MIN))
            .map(|dt| dt.with_timezone(&Utc));
        match midnight {
            Some(midnight) if midnight <= self.end => {}
            _ => self.week_start = None,
        }
    }
}

impl<Tz: TimeZone> Iterator for WeeklyInstants<'_, Tz> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let week_start = self.week_start?;

            if self.day_index >= self.days.len() {
                self.day_index = 0;
                self.week_start = week_start.checked_add_signed(TimeDelta::weeks(1));
                self.check_week_bound();
                continue;
            }

            let weekday = self.days[self.day_index];
            self.day_index += 1;

            let offset = i64::from(weekday.num_days_from_sunday());
            let Some(date) = week_start.checked_add_signed(TimeDelta::days(offset)) else {
                continue;
            };
            let Some(local) = resolve_local(self.tz, date.and_time(self.time)) else {
                continue;
            };
            return Some(Candidate {
                date,
                start: local.with_timezone(&Utc),
            });
        }
    }
}

/// The Sunday on or before `date`, or the earliest representable date when
/// that Sunday does not exist
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    let offset = TimeDelta::days(i64::from(date.weekday().num_days_from_sunday()));
    date.checked_sub_signed(offset).unwrap_or(NaiveDate::MIN)
}
