//! Error types shared across syllabus crates

use thiserror::Error;

use crate::SessionId;

/// Common error type for syllabus operations that cross crate boundaries
#[derive(Debug, Error)]
pub enum SyllabusError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

impl SyllabusError {
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    pub fn invalid_timestamp(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyllabusError>;
