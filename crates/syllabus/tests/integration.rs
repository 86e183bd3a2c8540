//! Integration tests for syllabus
//!
//! These tests run config → store → engine end to end.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::America::New_York;
use syllabus_api::{Occurrence, SessionTemplate};
use syllabus_config::{load_config, parse_config};
use syllabus_core::ExpandError;
use syllabus_store::{SessionStore, SqliteStore};
use syllabus_util::{CalendarBasis, SessionId};

const SPRING_TERM: &str = r#"
    config_version = 1

    [service]
    timezone = "America/New_York"
    occurrence_order = "chronological"

    [[sessions]]
    id = "python-lab"
    title = "Python Lab"
    lesson = "loops"
    start = "2026-03-02 18:00"
    end = "2026-03-02 19:30"
    recurrence = "FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20260318"

    [[sessions]]
    id = "orientation"
    title = "Orientation"
    start = "2026-03-04 09:00"
    end = "2026-03-04 10:00"
"#;

fn march(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn march_range(basis: CalendarBasis) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        basis.start_of_day(march(1)).unwrap(),
        basis.end_of_day(march(31)).unwrap(),
    )
}

fn seeded_store(sessions: &[SessionTemplate]) -> SqliteStore {
    let store = SqliteStore::in_memory().unwrap();
    for session in sessions {
        store.upsert_session(session).unwrap();
    }
    store
}

fn ids_and_days(listing: &[Occurrence]) -> Vec<(String, u32)> {
    listing
        .iter()
        .map(|o| {
            let local = o.start_time().with_timezone(&New_York);
            (o.session_id().to_string(), chrono::Datelike::day(&local))
        })
        .collect()
}

#[test]
fn test_config_loading() {
    let settings = parse_config(SPRING_TERM).unwrap();
    assert_eq!(settings.sessions.len(), 2);
    assert_eq!(settings.service.calendar, CalendarBasis::Zone(New_York));

    let lab = settings.get_session(&SessionId::new("python-lab")).unwrap();
    assert!(lab.is_recurring);
    assert_eq!(lab.duration(), Some(TimeDelta::minutes(90)));

    let orientation = settings.get_session(&SessionId::new("orientation")).unwrap();
    assert!(!orientation.is_recurring);
}

#[test]
fn test_term_listing_across_dst() {
    let settings = parse_config(SPRING_TERM).unwrap();
    let store = seeded_store(&settings.sessions);
    let (start, end) = march_range(settings.service.calendar);

    let sessions = store.list_sessions().unwrap();
    let listing = settings.expander().list_occurrences(&sessions, start, end).unwrap();

    assert_eq!(
        ids_and_days(&listing),
        vec![
            ("python-lab".to_string(), 2),
            ("orientation".to_string(), 4),
            ("python-lab".to_string(), 4),
            ("python-lab".to_string(), 9),
            ("python-lab".to_string(), 11),
            ("python-lab".to_string(), 16),
            ("python-lab".to_string(), 18),
        ]
    );

    // Wall-clock time and length survive the March 8 DST switch
    for occ in listing.iter().filter(|o| o.session_id().as_str() == "python-lab") {
        assert!(occ.synthetic);
        assert_eq!(occ.start_time().with_timezone(&New_York).hour(), 18);
        assert_eq!(occ.session.duration(), Some(TimeDelta::minutes(90)));
        assert_eq!(occ.session.lesson_id.as_ref().map(|l| l.as_str()), Some("loops"));
    }

    let before_switch = listing[0].start_time();
    let after_switch = listing[3].start_time();
    assert_eq!(before_switch, Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap());
    assert_eq!(after_switch, Utc.with_ymd_and_hms(2026, 3, 9, 22, 0, 0).unwrap());

    // The one-off session comes back as stored
    assert!(!listing[1].synthetic);
}

#[test]
fn test_exclusion_through_store() {
    let settings = parse_config(SPRING_TERM).unwrap();
    let store = seeded_store(&settings.sessions);
    let lab = SessionId::new("python-lab");
    let (start, end) = march_range(settings.service.calendar);

    store.add_excluded_date(&lab, march(11)).unwrap();

    let template = store.get_session(&lab).unwrap().unwrap();
    let occurrences = settings.expander().expand(&template, start, end).unwrap();
    let days: Vec<u32> = occurrences
        .iter()
        .map(|o| chrono::Datelike::day(&o.start_time().with_timezone(&New_York)))
        .collect();
    assert_eq!(days, vec![2, 4, 9, 16, 18]);

    assert!(store.remove_excluded_date(&lab, march(11)).unwrap());
    let template = store.get_session(&lab).unwrap().unwrap();
    let occurrences = settings.expander().expand(&template, start, end).unwrap();
    assert_eq!(occurrences.len(), 6);
}

#[test]
fn test_unsupported_frequency_falls_back_to_anchor() {
    let settings = parse_config(
        r#"
        config_version = 1

        [service]
        timezone = "America/New_York"

        [[sessions]]
        id = "monthly-review"
        title = "Monthly Review"
        start = "2026-03-10 15:00"
        end = "2026-03-10 16:00"
        recurrence = "FREQ=MONTHLY"
        "#,
    )
    .unwrap();
    let store = seeded_store(&settings.sessions);
    let (start, end) = march_range(settings.service.calendar);

    let listing = settings
        .expander()
        .list_occurrences(&store.list_sessions().unwrap(), start, end)
        .unwrap();

    assert_eq!(listing.len(), 1);
    assert!(!listing[0].synthetic);
    assert_eq!(listing[0].session, settings.sessions[0]);
}

#[test]
fn test_cap_rejects_listing() {
    let settings = parse_config(
        r#"
        config_version = 1

        [service]
        timezone = "America/New_York"
        max_occurrences = 5

        [[sessions]]
        id = "standup"
        title = "Daily Standup"
        start = "2026-03-01 09:00"
        end = "2026-03-01 09:15"
        recurrence = "FREQ=DAILY"
        "#,
    )
    .unwrap();
    let store = seeded_store(&settings.sessions);
    let (start, end) = march_range(settings.service.calendar);

    let result = settings
        .expander()
        .list_occurrences(&store.list_sessions().unwrap(), start, end);

    assert_eq!(
        result,
        Err(ExpandError::TooManyOccurrences {
            session_id: SessionId::new("standup"),
            limit: 5,
        })
    );
}

#[test]
fn test_stored_session_with_bad_rule_is_skipped() {
    let settings = parse_config(SPRING_TERM).unwrap();
    let mut sessions = settings.sessions.clone();
    sessions.push(SessionTemplate::recurring(
        "broken",
        "Broken",
        Utc.with_ymd_and_hms(2026, 3, 3, 14, 0, 0).unwrap(),
        None,
        "FREQ=WEEKLY;BYDAY=XX",
    ));
    let store = seeded_store(&sessions);
    let (start, end) = march_range(settings.service.calendar);

    let listing = settings
        .expander()
        .list_occurrences(&store.list_sessions().unwrap(), start, end)
        .unwrap();

    assert_eq!(listing.len(), 7);
    assert!(listing.iter().all(|o| o.session_id().as_str() != "broken"));
}

#[test]
fn test_on_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, SPRING_TERM).unwrap();

    let settings = load_config(&config_path).unwrap();
    let db_path = dir.path().join("syllabus.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        for session in &settings.sessions {
            store.upsert_session(session).unwrap();
        }
        store
            .add_excluded_date(&SessionId::new("python-lab"), march(16))
            .unwrap();
    }

    let store = SqliteStore::open(&db_path).unwrap();
    assert!(store.is_healthy());

    let (start, end) = march_range(settings.service.calendar);
    let listing = settings
        .expander()
        .list_occurrences(&store.list_sessions().unwrap(), start, end)
        .unwrap();

    assert_eq!(listing.len(), 6);
    assert!(listing
        .iter()
        .all(|o| !(o.session_id().as_str() == "python-lab"
            && chrono::Datelike::day(&o.start_time().with_timezone(&New_York)) == 16)));
}
