//! Core domain logic for student/course management.
//! This crate is the single source of truth for enrollment invariants.

pub mod config;
pub mod db;
pub mod ids;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, Environment, ScmConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use ids::{are_disjoint, has_duplicates, CanonicalId, CourseId, StudentId};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::course::{Course, CoursePatch, NewCourse};
pub use model::student::{Gender, NewStudent, Student, StudentPatch};
pub use model::validation::{parse_date_input, ValidationError};
pub use report::{CourseReportRow, EntityKind, Report, StudentReportRow};
pub use repo::course_repo::{CourseRepository, SqliteCourseRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{RepoError, RepoResult, SqliteTransactionScope, TransactionScope};
pub use search::CourseDateRange;
pub use service::audit::{AuditReport, EnrollmentAudit, EnrollmentDrift};
pub use service::course_service::CourseService;
pub use service::error::{ErrorKind, ServiceError, ServiceResult};
pub use service::report_service::ReportService;
pub use service::student_service::StudentService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
