//! Shared utilities for syllabus
//!
//! This crate provides:
//! - ID types (SessionId, LessonId)
//! - Time utilities (mockable wall clock, calendar basis, parsing helpers)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
