//! Store trait definitions

use chrono::NaiveDate;
use syllabus_api::SessionTemplate;
use syllabus_util::SessionId;

use crate::StoreResult;

/// Session template store
pub trait SessionStore: Send + Sync {
    // Templates

    /// Insert a session, or replace the stored one with the same ID
    fn upsert_session(&self, session: &SessionTemplate) -> StoreResult<()>;

    /// Get a session by ID
    fn get_session(&self, id: &SessionId) -> StoreResult<Option<SessionTemplate>>;

    /// All sessions ordered by anchor start
    fn list_sessions(&self) -> StoreResult<Vec<SessionTemplate>>;

    /// Delete a session. Returns whether it existed.
    fn delete_session(&self, id: &SessionId) -> StoreResult<bool>;

    // Exclusions

    /// Suppress the occurrence on `date`
    fn add_excluded_date(&self, id: &SessionId, date: NaiveDate) -> StoreResult<()>;

    /// Restore the occurrence on `date`. Returns whether it was excluded.
    fn remove_excluded_date(&self, id: &SessionId, date: NaiveDate) -> StoreResult<bool>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
