//! SQLite document store bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the student/course store.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No repository may touch data before migrations succeed.

use thiserror::Error;

pub mod migrations;
mod open;

pub(crate) use open::UNICODE_LOWER_FN;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(
        "database schema version {db_version} is newer than supported {latest_supported}"
    )]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
