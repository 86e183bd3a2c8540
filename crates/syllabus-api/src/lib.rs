//! Shared data types for syllabus
//!
//! This crate defines the records exchanged between the store, the
//! recurrence engine and the renderers:
//! - Session templates (stored)
//! - Occurrences (computed per query, never stored)
//! - Query ranges and ordering policy

mod types;

pub use types::*;
