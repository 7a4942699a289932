//! Service-level error taxonomy.
//!
//! # Invariants
//! - Domain errors from storage (`NotFound`, `Duplicate`) pass through unchanged.
//! - Backend failures are logged and surfaced with a generic message only.

use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use log::error;
use serde::Serialize;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

const INTERNAL_MESSAGE: &str = "Something went wrong!";

/// Error returned by every enrollment use case.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ServiceError {
    /// Malformed identifier or invalid input shape.
    #[error("{0}")]
    BadRequest(String),
    /// Entity absent, soft-deleted, or a referenced counterpart is missing.
    #[error("{0}")]
    NotFound(String),
    /// Uniqueness violation or an already-registered relationship.
    #[error("{0}")]
    Duplicate(String),
    /// Update request carries no effective change.
    #[error("No value changes!")]
    NoChange,
    /// Unexpected backend failure; details stay in the log.
    #[error("{0}")]
    Internal(String),
}

/// Stable classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Duplicate,
    NoChange,
    Internal,
}

impl ErrorKind {
    /// Transport status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::BadRequest | Self::NoChange => 400,
            Self::NotFound => 404,
            Self::Duplicate => 409,
            Self::Internal => 500,
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::NoChange => ErrorKind::NoChange,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(message) => Self::NotFound(message),
            RepoError::Duplicate(message) => Self::Duplicate(message),
            RepoError::Validation(err) => Self::from(err),
            RepoError::Db(err) => {
                error!("event=storage_failure module=service status=error error={err}");
                Self::Internal(INTERNAL_MESSAGE.to_string())
            }
            RepoError::InvalidData(detail) => {
                error!("event=invalid_persisted_data module=service status=error detail={detail}");
                Self::Internal(INTERNAL_MESSAGE.to_string())
            }
        }
    }
}
