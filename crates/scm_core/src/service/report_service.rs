//! Tabular reporting over active students and courses.

use crate::report::{CourseReportRow, EntityKind, Report, StudentReportRow};
use crate::repo::course_repo::CourseRepository;
use crate::repo::student_repo::StudentRepository;
use crate::service::error::ServiceResult;
use log::info;

/// Report use-case service.
pub struct ReportService<S, C>
where
    S: StudentRepository,
    C: CourseRepository,
{
    students: S,
    courses: C,
}

impl<S, C> ReportService<S, C>
where
    S: StudentRepository,
    C: CourseRepository,
{
    pub fn new(students: S, courses: C) -> Self {
        Self { students, courses }
    }

    /// One row per active student with its course count.
    pub fn students_report(&self) -> ServiceResult<Vec<StudentReportRow>> {
        Ok(self.students.report()?)
    }

    /// One row per active course with its registered-student count.
    pub fn courses_report(&self) -> ServiceResult<Vec<CourseReportRow>> {
        Ok(self.courses.report()?)
    }

    /// Builds the report for one collection. An empty collection yields an
    /// empty report, not an error.
    pub fn report(&self, kind: EntityKind) -> ServiceResult<Report> {
        let report = match kind {
            EntityKind::Student => Report::Students(self.students_report()?),
            EntityKind::Course => Report::Courses(self.courses_report()?),
        };
        info!(
            "event=report module=service status=ok entity={:?} rows={}",
            kind,
            report.len()
        );
        Ok(report)
    }
}
