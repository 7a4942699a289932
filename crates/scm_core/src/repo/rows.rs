//! Row encoding helpers shared by the student and course repositories.

use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

pub(super) fn parse_uuid(row: &Row<'_>, table: &str) -> RepoResult<Uuid> {
    let text: String = row.get("uuid")?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.uuid")))
}

pub(super) fn parse_instant(row: &Row<'_>, column: &str) -> RepoResult<DateTime<Utc>> {
    let millis: i64 = row.get(column)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| RepoError::InvalidData(format!("out-of-range instant `{millis}` in {column}")))
}

pub(super) fn parse_is_deleted(row: &Row<'_>) -> RepoResult<bool> {
    match row.get::<_, i64>("is_deleted")? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid is_deleted value `{other}`"
        ))),
    }
}

/// Decodes a JSON id list column.
pub(super) fn parse_id_list(row: &Row<'_>, column: &str) -> RepoResult<Vec<Uuid>> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text)
        .map_err(|err| RepoError::InvalidData(format!("invalid id list in {column}: {err}")))
}

/// Encodes an id list as a JSON array of canonical id strings.
pub(super) fn encode_id_list(ids: &[Uuid]) -> RepoResult<String> {
    serde_json::to_string(ids)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode id list: {err}")))
}

pub(super) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Returns whether the error is a UNIQUE constraint violation.
pub(super) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
