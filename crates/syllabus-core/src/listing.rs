//! Calendar listings across many sessions

use chrono::{DateTime, Utc};
use syllabus_api::{Occurrence, SessionTemplate};
use tracing::{debug, warn};

use crate::{ExpandError, ExpandResult, Expander};

impl Expander {
    /// Expand every session and merge the results into one list ordered by
    /// start time.
    ///
    /// One-off sessions are only listed when they start inside the range.
    /// A session with an unparseable rule is skipped with a warning; a
    /// session exceeding the occurrence cap fails the whole listing.
    pub fn list_occurrences<'a>(
        &self,
        sessions: impl IntoIterator<Item = &'a SessionTemplate>,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> ExpandResult<Vec<Occurrence>> {
        let mut listing = Vec::new();

        for session in sessions {
            if session.active_rule().is_none() {
                if session.start_time >= range_start && session.start_time <= range_end {
                    listing.push(Occurrence::original(session.clone()));
                }
                continue;
            }

            match self.expand(session, range_start, range_end) {
                Ok(occurrences) => listing.extend(occurrences),
                Err(ExpandError::Rule(e)) => {
                    warn!(
                        session_id = %session.id,
                        error = %e,
                        "Skipping session with invalid rule"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        listing.sort_by(|a, b| {
            a.start_time()
                .cmp(&b.start_time())
                .then_with(|| a.session_id().cmp(b.session_id()))
        });

        debug!(occurrences = listing.len(), "Calendar listing built");
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExpandOptions;
    use chrono::TimeZone;
    use syllabus_util::CalendarBasis;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, d, h, 0, 0).unwrap()
    }

    fn expander(max: Option<usize>) -> Expander {
        Expander::new(
            CalendarBasis::Zone(chrono_tz::UTC),
            ExpandOptions {
                max_occurrences: max,
                ..ExpandOptions::default()
            },
        )
    }

    #[test]
    fn merges_sessions_chronologically() {
        let sessions = vec![
            SessionTemplate::recurring(
                "seminar",
                "Seminar",
                at(2, 18),
                None,
                "FREQ=WEEKLY;BYDAY=WE,MO",
            ),
            SessionTemplate::recurring(
                "standup",
                "Standup",
                at(3, 9),
                None,
                "FREQ=DAILY;UNTIL=20260205",
            ),
            SessionTemplate::single("kickoff", "Kickoff", at(4, 12), None),
        ];

        let listing = expander(None).list_occurrences(&sessions, at(1, 0), at(7, 0)).unwrap();
        let order: Vec<_> = listing
            .iter()
            .map(|o| (o.session_id().as_str(), o.start_time()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("seminar", at(2, 18)),
                ("standup", at(3, 9)),
                ("standup", at(4, 9)),
                ("kickoff", at(4, 12)),
                ("seminar", at(4, 18)),
                ("standup", at(5, 9)),
            ]
        );
    }

    #[test]
    fn one_off_sessions_outside_range_are_not_listed() {
        let sessions = vec![SessionTemplate::single("kickoff", "Kickoff", at(20, 12), None)];
        let listing = expander(None).list_occurrences(&sessions, at(1, 0), at(7, 0)).unwrap();
        assert!(listing.is_empty());
    }

    #[test]
    fn invalid_rules_are_skipped() {
        let sessions = vec![
            SessionTemplate::recurring("broken", "Broken", at(2, 9), None, "FREQ=DAILY;UNTIL=soon"),
            SessionTemplate::recurring("ok", "Ok", at(2, 9), None, "FREQ=DAILY;UNTIL=20260203"),
        ];
        let listing = expander(None).list_occurrences(&sessions, at(1, 0), at(7, 0)).unwrap();
        assert_eq!(listing.len(), 2);
        assert!(listing.iter().all(|o| o.session_id().as_str() == "ok"));
    }

    #[test]
    fn cap_violation_fails_listing() {
        let sessions = vec![SessionTemplate::recurring(
            "daily",
            "Daily",
            at(1, 9),
            None,
            "FREQ=DAILY",
        )];
        let result = expander(Some(3)).list_occurrences(&sessions, at(1, 0), at(7, 0));
        assert!(matches!(result, Err(ExpandError::TooManyOccurrences { limit: 3, .. })));
    }
}
