//! Enrollment use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep both sides of the student/course relationship consistent.
//!
//! # Invariants
//! - Services are storage-agnostic: they only see repository traits and a
//!   [`TransactionScope`](crate::repo::TransactionScope).
//! - Two-sided relationship writes always run inside one atomic scope.

pub mod audit;
pub mod course_service;
pub mod error;
pub mod report_service;
pub mod student_service;

use crate::ids::{has_duplicates, parse_id};
use chrono::{DateTime, Utc};
use error::{ServiceError, ServiceResult};
use uuid::Uuid;

/// Parses a path-style identifier, reporting malformed text as a bad request.
pub(crate) fn parse_entity_id(value: &str, entity: &str) -> ServiceResult<Uuid> {
    parse_id(value).ok_or_else(|| ServiceError::bad_request(format!("Invalid {entity} ID!")))
}

/// Parses a relationship id list supplied by a caller.
///
/// Repeated ids are a `Duplicate` error; malformed ids are a bad request.
pub(crate) fn parse_id_list(values: &[String], field: &str) -> ServiceResult<Vec<Uuid>> {
    if has_duplicates(values) {
        return Err(ServiceError::duplicate(format!(
            "Duplicate IDs found in {field}!"
        )));
    }
    values
        .iter()
        .map(|value| {
            parse_id(value)
                .ok_or_else(|| ServiceError::bad_request(format!("Invalid ID `{value}` in {field}!")))
        })
        .collect()
}

/// Returns the trimmed value when it differs from `current`.
pub(crate) fn changed_text(candidate: Option<&String>, current: &str) -> Option<String> {
    let candidate = candidate?.trim();
    (candidate != current.trim()).then(|| candidate.to_string())
}

/// Returns the value when it differs from `current`.
pub(crate) fn changed<T: PartialEq + Copy>(candidate: Option<T>, current: T) -> Option<T> {
    candidate.filter(|value| *value != current)
}

/// Returns the candidate instant when it differs from `current` at the
/// millisecond precision storage keeps.
pub(crate) fn changed_instant(
    candidate: Option<DateTime<Utc>>,
    current: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let candidate = truncate_to_millis(candidate?);
    (candidate != truncate_to_millis(current)).then_some(candidate)
}

fn truncate_to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or(value)
}
