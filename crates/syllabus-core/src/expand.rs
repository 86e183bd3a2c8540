//! Occurrence expansion

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};
use syllabus_api::{Occurrence, OccurrenceOrder, SessionTemplate};
use syllabus_util::{resolve_local, CalendarBasis};
use tracing::{debug, trace};

use crate::{
    Candidate, DailyInstants, ExpandError, ExpandResult, Frequency, ParsedRule, WeeklyInstants,
    week_start_of,
};

/// Default per-session cap on generated occurrences
pub const DEFAULT_MAX_OCCURRENCES: usize = 10_000;

/// Tuning knobs for expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Reject a session that would produce more occurrences than this.
    /// None disables the cap.
    pub max_occurrences: Option<usize>,
    pub order: OccurrenceOrder,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_occurrences: Some(DEFAULT_MAX_OCCURRENCES),
            order: OccurrenceOrder::Generated,
        }
    }
}

/// Expands session templates in a fixed calendar basis
#[derive(Debug, Clone, Copy, Default)]
pub struct Expander {
    basis: CalendarBasis,
    options: ExpandOptions,
}

impl Expander {
    pub fn new(basis: CalendarBasis, options: ExpandOptions) -> Self {
        Self { basis, options }
    }

    pub fn basis(&self) -> CalendarBasis {
        self.basis
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Expand `session` into the occurrences that start within
    /// `[range_start, range_end]`.
    ///
    /// Non-recurring sessions come back unchanged regardless of the range.
    /// When a recurring session yields nothing, the stored session is
    /// returned if its anchor start lies in the range.
    pub fn expand(
        &self,
        session: &SessionTemplate,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> ExpandResult<Vec<Occurrence>> {
        match self.basis {
            CalendarBasis::Local => {
                expand_in_zone(&Local, session, range_start, range_end, &self.options)
            }
            CalendarBasis::Zone(tz) => {
                expand_in_zone(&tz, session, range_start, range_end, &self.options)
            }
        }
    }
}

/// Expansion with the calendar given as a concrete [`TimeZone`].
pub fn expand_in_zone<Tz: TimeZone>(
    tz: &Tz,
    session: &SessionTemplate,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    options: &ExpandOptions,
) -> ExpandResult<Vec<Occurrence>> {
    let Some(rule_str) = session.active_rule() else {
        return Ok(vec![Occurrence::original(session.clone())]);
    };

    let rule = ParsedRule::parse(rule_str)?;

    let until = rule
        .until
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .and_then(|naive| resolve_local(tz, naive))
        .map(|dt| dt.with_timezone(&Utc));
    let effective_end = match until {
        Some(until) if until < range_end => until,
        _ => range_end,
    };

    let anchor = session.start_time.with_timezone(tz);
    let anchor_date = anchor.date_naive();
    let window = Window {
        anchor: session.start_time,
        anchor_date,
        range_start,
        effective_end,
        session,
    };

    // Candidates before the range or the anchor cannot qualify; start the
    // walks near whichever comes later.
    let walk_from = range_start.max(session.start_time);
    let range_date = walk_from.with_timezone(tz).date_naive();

    let mut occurrences = match &rule.freq {
        Some(Frequency::Daily) => {
            let first_date = anchor_date.max(range_date.pred_opt().unwrap_or(range_date));
            let walk = DailyInstants::new(tz, first_date, anchor.time(), effective_end);
            window.collect(walk, options)?
        }
        Some(Frequency::Weekly) => {
            let days = if rule.by_day.is_empty() {
                vec![anchor.weekday()]
            } else {
                rule.by_day.clone()
            };
            let time = anchor.time();
            let time = time.with_nanosecond(0).unwrap_or(time);
            let range_week = week_start_of(range_date)
                .checked_sub_signed(TimeDelta::weeks(1))
                .unwrap_or(range_date);
            let first_week = week_start_of(anchor_date).max(range_week);
            let walk = WeeklyInstants::new(tz, first_week, time, days, effective_end);
            window.collect(walk, options)?
        }
        Some(Frequency::Unsupported(freq)) => {
            debug!(
                session_id = %session.id,
                freq = %freq,
                "Unsupported frequency, no occurrences generated"
            );
            Vec::new()
        }
        None => {
            debug!(session_id = %session.id, "Rule has no FREQ, no occurrences generated");
            Vec::new()
        }
    };

    if occurrences.is_empty() {
        if session.start_time >= range_start && session.start_time <= range_end {
            debug!(session_id = %session.id, "No occurrences in range, falling back to anchor");
            return Ok(vec![Occurrence::original(session.clone())]);
        }
        return Ok(Vec::new());
    }

    if options.order == OccurrenceOrder::Chronological {
        occurrences.sort_by_key(Occurrence::start_time);
    }

    debug!(
        session_id = %session.id,
        occurrences = occurrences.len(),
        "Expanded recurring session"
    );
    Ok(occurrences)
}

/// Filters a candidate walk down to the occurrences a query admits
struct Window<'a> {
    anchor: DateTime<Utc>,
    anchor_date: NaiveDate,
    range_start: DateTime<Utc>,
    effective_end: DateTime<Utc>,
    session: &'a SessionTemplate,
}

impl Window<'_> {
    fn admits(&self, candidate: &Candidate) -> bool {
        candidate.start >= self.anchor
            && candidate.start >= self.range_start
            && candidate.start <= self.effective_end
            && !self.is_excluded(candidate.date)
    }

    /// The anchor's own day always starts at the stored instant, which a
    /// rebuilt wall-clock time can miss inside a DST fold.
    fn pin_anchor(&self, candidate: Candidate) -> Candidate {
        if candidate.date == self.anchor_date {
            Candidate {
                start: self.anchor,
                ..candidate
            }
        } else {
            candidate
        }
    }

    fn is_excluded(&self, date: NaiveDate) -> bool {
        let excluded = self.session.is_excluded(date);
        if excluded {
            trace!(session_id = %self.session.id, date = %date, "Occurrence excluded");
        }
        excluded
    }

    fn collect(
        &self,
        walk: impl Iterator<Item = Candidate>,
        options: &ExpandOptions,
    ) -> ExpandResult<Vec<Occurrence>> {
        let mut occurrences = Vec::new();
        let admitted = walk.map(|c| self.pin_anchor(c)).filter(|c| self.admits(c));
        for candidate in admitted {
            if let Some(limit) = options.max_occurrences
                && occurrences.len() >= limit
            {
                debug!(session_id = %self.session.id, limit, "Occurrence cap exceeded");
                return Err(ExpandError::TooManyOccurrences {
                    session_id: self.session.id.clone(),
                    limit,
                });
            }
            occurrences.push(Occurrence::generated(self.session, candidate.start));
        }
        Ok(occurrences)
    }
}
