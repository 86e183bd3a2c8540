//! Configuration validation

use crate::schema::{RawConfig, RawServiceConfig, RawSession};
use std::collections::HashSet;
use syllabus_api::OccurrenceOrder;
use syllabus_core::{ParsedRule, RuleError};
use syllabus_util::{parse_date, parse_timestamp, CalendarBasis};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Session '{session_id}': {message}")]
    SessionError { session_id: String, message: String },

    #[error("Duplicate session ID: {0}")]
    DuplicateSessionId(String),

    #[error("Session '{session_id}': invalid timestamp '{value}': {message}")]
    InvalidTimestamp {
        session_id: String,
        value: String,
        message: String,
    },

    #[error("Session '{session_id}': {error}")]
    InvalidRule { session_id: String, error: RuleError },

    #[error("Session '{session_id}': invalid excluded date '{value}', expected YYYY-MM-DD")]
    InvalidExcludedDate { session_id: String, value: String },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let basis = match calendar_basis(&config.service) {
        Ok(basis) => basis,
        Err(e) => {
            errors.push(e);
            CalendarBasis::Local
        }
    };
    errors.extend(validate_service(&config.service));

    let mut seen_ids = HashSet::new();
    for session in &config.sessions {
        if !seen_ids.insert(&session.id) {
            errors.push(ValidationError::DuplicateSessionId(session.id.clone()));
        }
    }

    for session in &config.sessions {
        errors.extend(validate_session(session, basis));
    }

    errors
}

/// Resolve the configured calendar zone (default: process-local)
pub fn calendar_basis(service: &RawServiceConfig) -> Result<CalendarBasis, ValidationError> {
    match &service.timezone {
        Some(tz) => tz
            .parse::<CalendarBasis>()
            .map_err(|_| ValidationError::UnknownTimezone(tz.clone())),
        None => Ok(CalendarBasis::Local),
    }
}

fn validate_service(service: &RawServiceConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(order) = &service.occurrence_order
        && let Err(e) = order.parse::<OccurrenceOrder>()
    {
        errors.push(ValidationError::GlobalError(e));
    }

    if service.default_window_days == Some(0) {
        errors.push(ValidationError::GlobalError(
            "default_window_days must be at least 1".into(),
        ));
    }

    errors
}

fn validate_session(session: &RawSession, basis: CalendarBasis) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let session_error = |message: &str| ValidationError::SessionError {
        session_id: session.id.clone(),
        message: message.into(),
    };

    if session.id.trim().is_empty() {
        errors.push(session_error("id cannot be empty"));
    }
    if session.title.trim().is_empty() {
        errors.push(session_error("title cannot be empty"));
    }

    let start = parse_timestamp(&session.start, basis);
    if let Err(e) = &start {
        errors.push(ValidationError::InvalidTimestamp {
            session_id: session.id.clone(),
            value: session.start.clone(),
            message: e.to_string(),
        });
    }

    if let Some(end_str) = &session.end {
        match parse_timestamp(end_str, basis) {
            Ok(end) => {
                if let Ok(start) = &start
                    && end < *start
                {
                    errors.push(session_error("end must not be before start"));
                }
            }
            Err(e) => errors.push(ValidationError::InvalidTimestamp {
                session_id: session.id.clone(),
                value: end_str.clone(),
                message: e.to_string(),
            }),
        }
    }

    if let Some(rule) = &session.recurrence
        && let Err(error) = ParsedRule::parse(rule)
    {
        errors.push(ValidationError::InvalidRule {
            session_id: session.id.clone(),
            error,
        });
    }

    if session.is_recurring == Some(true) && session.recurrence.is_none() {
        errors.push(session_error("is_recurring is set but no recurrence rule is given"));
    }

    for value in &session.excluded_dates {
        if parse_date(value).is_err() {
            errors.push(ValidationError::InvalidExcludedDate {
                session_id: session.id.clone(),
                value: value.clone(),
            });
        }
    }

    errors
}
