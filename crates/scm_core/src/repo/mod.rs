//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-collection data access contracts for students and courses.
//! - Isolate SQLite query details from enrollment orchestration.
//! - Provide the atomic write scope used for two-sided relationship updates.
//!
//! # Invariants
//! - Write paths call the document `validate()` before any SQL mutation.
//! - Soft-deleted documents are invisible to every read except the explicit
//!   filter queries.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) apart
//!   from DB transport errors.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use log::warn;
use rusqlite::Connection;
use thiserror::Error;

pub mod course_repo;
pub mod filter;
mod rows;
pub mod student_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Document shape rejected before write.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Document or result set absent (or soft-deleted).
    #[error("{0}")]
    NotFound(String),
    /// Uniqueness violation.
    #[error("{0}")]
    Duplicate(String),
    #[error(transparent)]
    Db(#[from] DbError),
    /// Persisted row cannot be decoded into a valid document.
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Unit-of-work seam for writes that must land on both sides of a
/// relationship or not at all.
pub trait TransactionScope {
    /// Runs `work` atomically; any error rolls back every write it made.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>;
}

/// SQLite savepoint-backed transaction scope.
///
/// Savepoints nest, so scopes may be entered while a caller already holds an
/// outer transaction on the same connection.
pub struct SqliteTransactionScope<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTransactionScope<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

const SAVEPOINT_NAME: &str = "enrollment_write";

impl TransactionScope for SqliteTransactionScope<'_> {
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>,
    {
        self.conn
            .execute_batch(&format!("SAVEPOINT {SAVEPOINT_NAME};"))
            .map_err(|err| E::from(RepoError::from(err)))?;

        match work() {
            Ok(value) => {
                self.conn
                    .execute_batch(&format!("RELEASE {SAVEPOINT_NAME};"))
                    .map_err(|err| E::from(RepoError::from(err)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.execute_batch(&format!(
                    "ROLLBACK TO {SAVEPOINT_NAME}; RELEASE {SAVEPOINT_NAME};"
                )) {
                    warn!(
                        "event=tx_rollback module=repo status=error error={rollback_err}"
                    );
                }
                Err(err)
            }
        }
    }
}
