//! syllabus - recurring class sessions on the command line
//!
//! This is the main entry point for the syllabus tool.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Recurrence engine
//!
//! Occurrences go to stdout; logs go to stderr.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, TimeDelta};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use syllabus_api::{DateRange, Occurrence, SessionTemplate};
use syllabus_config::{ServiceConfig, Settings, load_config};
use syllabus_store::{SessionStore, SqliteStore};
use syllabus_util::{
    CalendarBasis, DATABASE_FILENAME, SessionId, SyllabusError, default_config_path,
    format_datetime_full, format_duration, parse_date,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// syllabus - Recurring class sessions and their calendar occurrences
#[derive(Parser, Debug)]
#[command(name = "syllabus")]
#[command(about = "Recurring class sessions and their calendar occurrences", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/syllabus/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set SYLLABUS_DATA_DIR env var)
    #[arg(short, long, global = true, env = "SYLLABUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upsert the sessions from the config file into the store
    Import,

    /// List occurrences in a date range
    Occurrences {
        /// First day of the range, YYYY-MM-DD (default: today)
        #[arg(long)]
        from: Option<String>,

        /// Last day of the range, YYYY-MM-DD (default: the configured window)
        #[arg(long)]
        to: Option<String>,

        /// Only this session
        #[arg(long)]
        session: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Skip a session on a date
    Exclude { session: String, date: String },

    /// Undo an exclusion
    Include { session: String, date: String },

    /// Delete a stored session
    Remove { session: String },

    /// List stored sessions
    Sessions,
}

/// Settings from the config file, or defaults when there is none
fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        warn!(config_path = %path.display(), "No configuration file, using defaults");
        return Ok(Settings {
            service: ServiceConfig::default(),
            sessions: Vec::new(),
        });
    }

    let settings = load_config(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;

    info!(
        config_path = %path.display(),
        session_count = settings.sessions.len(),
        calendar = %settings.service.calendar,
        "Configuration loaded"
    );
    Ok(settings)
}

fn open_store(data_dir: &Path) -> Result<SqliteStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join(DATABASE_FILENAME);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    debug!(db_path = %db_path.display(), "Store initialized");
    Ok(store)
}

fn import(settings: &Settings, store: &dyn SessionStore) -> Result<()> {
    for session in &settings.sessions {
        store
            .upsert_session(session)
            .with_context(|| format!("Failed to store session {}", session.id))?;
    }

    info!(session_count = settings.sessions.len(), "Sessions imported");
    println!("Imported {} session(s)", settings.sessions.len());
    Ok(())
}

fn remove_session(store: &dyn SessionStore, id: &SessionId) -> Result<()> {
    if !store.delete_session(id)? {
        return Err(SyllabusError::SessionNotFound(id.clone()).into());
    }

    info!(session_id = %id, "Session removed");
    println!("Removed {}", id);
    Ok(())
}

/// Range from `--from`/`--to`, defaulting to today plus the configured window
fn query_range(
    from: Option<&str>,
    to: Option<&str>,
    basis: CalendarBasis,
    window: TimeDelta,
) -> Result<DateRange> {
    let from_date = match from {
        Some(s) => parse_date(s)?,
        None => basis.date_of(syllabus_util::now()),
    };
    let start = day_boundary(basis.start_of_day(from_date), from_date)?;

    let end = match to {
        Some(s) => {
            let to_date = parse_date(s)?;
            day_boundary(basis.end_of_day(to_date), to_date)?
        }
        None => start + window,
    };

    Ok(DateRange::new(start, end)?)
}

fn day_boundary<T>(instant: Option<T>, date: NaiveDate) -> Result<T> {
    instant.ok_or_else(|| {
        SyllabusError::invalid_timestamp(date.to_string(), "day boundary does not exist").into()
    })
}

fn occurrences(
    settings: &Settings,
    store: &dyn SessionStore,
    range: DateRange,
    session: Option<&str>,
) -> Result<Vec<Occurrence>> {
    let sessions: Vec<SessionTemplate> = match session {
        Some(id) => {
            let id = SessionId::new(id);
            match store.get_session(&id)? {
                Some(s) => vec![s],
                None => return Err(SyllabusError::SessionNotFound(id).into()),
            }
        }
        None => store.list_sessions()?,
    };

    debug!(
        session_count = sessions.len(),
        range_start = %range.start,
        range_end = %range.end,
        "Listing occurrences"
    );

    let listing = settings
        .expander()
        .list_occurrences(&sessions, range.start, range.end)?;
    Ok(listing)
}

fn print_occurrences(listing: &[Occurrence], basis: CalendarBasis) {
    if listing.is_empty() {
        println!("No occurrences in range");
        return;
    }

    for occ in listing {
        let length = occ
            .session
            .duration()
            .map(format_duration)
            .unwrap_or_else(|| "-".into());
        println!(
            "{}  {:>7}  {:<24} {}",
            format_datetime_full(occ.start_time(), basis),
            length,
            occ.session_id(),
            occ.session.title
        );
    }
}

fn print_sessions(sessions: &[SessionTemplate], basis: CalendarBasis) {
    if sessions.is_empty() {
        println!("No sessions stored");
        return;
    }

    for session in sessions {
        let rule = session.active_rule().unwrap_or("one-off");
        println!(
            "{:<24} {}  {:<40} {}",
            session.id.as_str(),
            format_datetime_full(session.start_time, basis),
            rule,
            session.title
        );
        if !session.excluded_dates.is_empty() {
            let dates: Vec<String> = session.excluded_dates.iter().map(|d| d.to_string()).collect();
            println!("{:<24} excluded: {}", "", dates.join(", "));
        }
    }
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args.config)?;
    let basis = settings.service.calendar;

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| settings.service.data_dir.clone());
    let store = open_store(&data_dir)?;

    match args.command {
        Command::Import => import(&settings, &store)?,

        Command::Occurrences {
            from,
            to,
            session,
            json,
        } => {
            let range = query_range(
                from.as_deref(),
                to.as_deref(),
                basis,
                settings.service.default_window,
            )?;
            let listing = occurrences(&settings, &store, range, session.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_occurrences(&listing, basis);
            }
        }

        Command::Exclude { session, date } => {
            let id = SessionId::new(session);
            let date = parse_date(&date)?;
            store
                .add_excluded_date(&id, date)
                .with_context(|| format!("Failed to exclude {} from {}", date, id))?;
            info!(session_id = %id, date = %date, "Date excluded");
            println!("Excluded {} from {}", date, id);
        }

        Command::Include { session, date } => {
            let id = SessionId::new(session);
            let date = parse_date(&date)?;
            if store.remove_excluded_date(&id, date)? {
                info!(session_id = %id, date = %date, "Exclusion removed");
                println!("{} is scheduled again on {}", id, date);
            } else {
                println!("{} was not excluded on {}", id, date);
            }
        }

        Command::Remove { session } => remove_session(&store, &SessionId::new(session))?,

        Command::Sessions => {
            let sessions = store.list_sessions()?;
            print_sessions(&sessions, basis);
        }
    }

    if !store.is_healthy() {
        bail!("Store is unhealthy after command");
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        mock_time = syllabus_util::is_mock_time_active(),
        "syllabus starting"
    );

    run(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "syllabus",
            "--config",
            "/tmp/none.toml",
            "occurrences",
            "--from",
            "2026-02-01",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("/tmp/none.toml"));
        match args.command {
            Command::Occurrences { from, to, json, .. } => {
                assert_eq!(from.as_deref(), Some("2026-02-01"));
                assert_eq!(to, None);
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_query_range_explicit_days() {
        let basis = CalendarBasis::Zone(chrono_tz::UTC);
        let range = query_range(
            Some("2026-02-01"),
            Some("2026-02-07"),
            basis,
            TimeDelta::days(7),
        )
        .unwrap();

        assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 2, 7, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_query_range_default_window() {
        let basis = CalendarBasis::Zone(chrono_tz::UTC);
        let range = query_range(Some("2026-02-01"), None, basis, TimeDelta::days(3)).unwrap();
        assert_eq!(range.end - range.start, TimeDelta::days(3));
    }

    #[test]
    fn test_query_range_rejects_inverted() {
        let basis = CalendarBasis::Zone(chrono_tz::UTC);
        let week = TimeDelta::days(7);
        assert!(query_range(Some("2026-02-07"), Some("2026-02-01"), basis, week).is_err());
        assert!(query_range(Some("02/01/2026"), None, basis, week).is_err());
    }

    #[test]
    fn test_remove_session() {
        let store = SqliteStore::in_memory().unwrap();
        let session = SessionTemplate::single(
            "orientation",
            "Orientation",
            Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap(),
            None,
        );
        store.upsert_session(&session).unwrap();

        let args = Args::try_parse_from(["syllabus", "remove", "orientation"]).unwrap();
        let Command::Remove { session: id } = args.command else {
            panic!("expected remove command");
        };
        let id = SessionId::new(id);

        remove_session(&store, &id).unwrap();
        assert!(store.get_session(&id).unwrap().is_none());
        assert!(remove_session(&store, &id).is_err());
    }

    #[test]
    fn test_occurrences_for_unknown_session() {
        let store = SqliteStore::in_memory().unwrap();
        let settings = Settings {
            service: ServiceConfig::default(),
            sessions: Vec::new(),
        };
        let range = DateRange::new(
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 8, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let result = occurrences(&settings, &store, range, Some("ghost"));
        assert!(result.is_err());
    }
}
