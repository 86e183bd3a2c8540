//! SQLite-based store implementation

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use syllabus_api::SessionTemplate;
use syllabus_util::{LessonId, SessionId};
use tracing::{debug, warn};

use crate::{SessionStore, StoreError, StoreResult};

const SESSION_COLUMNS: &str =
    "id, title, lesson_id, start_time, end_time, is_recurring, recurrence_rule, excluded_dates";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Session templates
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                lesson_id TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                recurrence_rule TEXT,
                excluded_dates TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_sessions_start ON sessions(start_time);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

/// Raw column values of a session row, decoded outside the rusqlite closure
struct SessionRow {
    id: String,
    title: String,
    lesson_id: Option<String>,
    start_time: String,
    end_time: Option<String>,
    is_recurring: bool,
    recurrence_rule: Option<String>,
    excluded_dates: String,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            lesson_id: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            is_recurring: row.get(5)?,
            recurrence_rule: row.get(6)?,
            excluded_dates: row.get(7)?,
        })
    }

    fn into_session(self) -> StoreResult<SessionTemplate> {
        let excluded: Vec<NaiveDate> = serde_json::from_str(&self.excluded_dates)?;
        Ok(SessionTemplate {
            id: SessionId::new(self.id),
            title: self.title,
            lesson_id: self.lesson_id.map(LessonId::new),
            start_time: parse_instant(&self.start_time)?,
            end_time: self.end_time.as_deref().map(parse_instant).transpose()?,
            is_recurring: self.is_recurring,
            recurrence_rule: self.recurrence_rule,
            excluded_dates: excluded.into_iter().collect(),
        })
    }
}

fn parse_instant(s: &str) -> StoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn load_session(conn: &Connection, id: &SessionId) -> StoreResult<Option<SessionTemplate>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS),
            [id.as_str()],
            SessionRow::from_row,
        )
        .optional()?;

    row.map(SessionRow::into_session).transpose()
}

fn write_excluded_dates(
    conn: &Connection,
    id: &SessionId,
    dates: &BTreeSet<NaiveDate>,
) -> StoreResult<()> {
    let json = serde_json::to_string(dates)?;
    conn.execute(
        "UPDATE sessions SET excluded_dates = ?, updated_at = ? WHERE id = ?",
        params![json, syllabus_util::now().to_rfc3339(), id.as_str()],
    )?;
    Ok(())
}

impl SessionStore for SqliteStore {
    fn upsert_session(&self, session: &SessionTemplate) -> StoreResult<()> {
        let conn = self.conn()?;
        let excluded_json = serde_json::to_string(&session.excluded_dates)?;

        conn.execute(
            r#"
            INSERT INTO sessions (
                id, title, lesson_id, start_time, end_time,
                is_recurring, recurrence_rule, excluded_dates, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                lesson_id = excluded.lesson_id,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                is_recurring = excluded.is_recurring,
                recurrence_rule = excluded.recurrence_rule,
                excluded_dates = excluded.excluded_dates,
                updated_at = excluded.updated_at
            "#,
            params![
                session.id.as_str(),
                session.title,
                session.lesson_id.as_ref().map(LessonId::as_str),
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
                session.is_recurring,
                session.recurrence_rule,
                excluded_json,
                syllabus_util::now().to_rfc3339(),
            ],
        )?;

        debug!(session_id = %session.id, "Session stored");
        Ok(())
    }

    fn get_session(&self, id: &SessionId) -> StoreResult<Option<SessionTemplate>> {
        let conn = self.conn()?;
        load_session(&conn, id)
    }

    fn list_sessions(&self) -> StoreResult<Vec<SessionTemplate>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sessions ORDER BY start_time, id",
            SESSION_COLUMNS
        ))?;
        let rows = stmt.query_map([], SessionRow::from_row)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }

        Ok(sessions)
    }

    fn delete_session(&self, id: &SessionId) -> StoreResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?", [id.as_str()])?;
        if deleted > 0 {
            debug!(session_id = %id, "Session deleted");
        }
        Ok(deleted > 0)
    }

    fn add_excluded_date(&self, id: &SessionId, date: NaiveDate) -> StoreResult<()> {
        let conn = self.conn()?;
        let mut session = load_session(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if session.excluded_dates.insert(date) {
            write_excluded_dates(&conn, id, &session.excluded_dates)?;
            debug!(session_id = %id, date = %date, "Excluded date added");
        }
        Ok(())
    }

    fn remove_excluded_date(&self, id: &SessionId, date: NaiveDate) -> StoreResult<bool> {
        let conn = self.conn()?;
        let mut session = load_session(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let removed = session.excluded_dates.remove(&date);
        if removed {
            write_excluded_dates(&conn, id, &session.excluded_dates)?;
            debug!(session_id = %id, date = %date, "Excluded date removed");
        }
        Ok(removed)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
