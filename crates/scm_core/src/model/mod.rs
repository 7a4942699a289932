//! Student/course document model.
//!
//! # Responsibility
//! - Define the canonical student and course documents used by storage and
//!   enrollment services.
//! - Own input-shape validation shared by every write path.
//!
//! # Invariants
//! - Every document is identified by a stable UUID.
//! - Deletion is a soft-delete flag, never a physical removal.
//! - Relationship lists never contain the same id twice.

pub mod course;
pub mod student;
pub mod validation;

use chrono::{DateTime, Utc};

/// Current instant truncated to the millisecond precision storage keeps.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
