//! Recurrence engine for syllabus
//!
//! This crate turns stored session templates into calendar occurrences:
//! - Rule parsing (`FREQ`, `BYDAY`, `UNTIL`)
//! - Lazy instant walks for DAILY and WEEKLY rules
//! - Expansion with range clipping, exclusions and the anchor fallback
//! - Multi-session calendar listings
//!
//! The engine is pure: no I/O, no shared state, no ambient clock. The
//! calendar basis is passed in explicitly.

mod expand;
mod instants;
mod listing;
mod rule;

pub use expand::*;
pub use instants::*;
pub use listing::*;
pub use rule::*;

use syllabus_util::SessionId;
use thiserror::Error;

/// Expansion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("Invalid recurrence rule: {0}")]
    Rule(#[from] RuleError),

    #[error("Session {session_id} expands to more than {limit} occurrences in the requested range")]
    TooManyOccurrences { session_id: SessionId, limit: usize },
}

pub type ExpandResult<T> = Result<T, ExpandError>;
