//! Enrollment consistency audit and repair.
//!
//! # Responsibility
//! - Detect drift between `Student.courses` and `Course.enrolled_students`.
//! - Repair drift: complete one-sided links between active documents and
//!   prune links that point at missing or soft-deleted documents.
//!
//! # Invariants
//! - Only active documents are inspected and rewritten.
//! - A repair pass runs in one atomic scope.

use crate::ids::{CourseId, StudentId};
use crate::model::course::{Course, CourseUpdate};
use crate::model::student::{Student, StudentUpdate};
use crate::repo::course_repo::CourseRepository;
use crate::repo::filter::Filter;
use crate::repo::student_repo::StudentRepository;
use crate::repo::TransactionScope;
use crate::service::error::ServiceResult;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;

/// One relationship inconsistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnrollmentDrift {
    /// Student lists the course, the course does not list the student.
    MissingOnCourse {
        student_id: StudentId,
        course_id: CourseId,
    },
    /// Course lists the student, the student does not list the course.
    MissingOnStudent {
        student_id: StudentId,
        course_id: CourseId,
    },
    /// Student lists a course that is missing or deleted.
    DanglingCourse {
        student_id: StudentId,
        course_id: CourseId,
    },
    /// Course lists a student that is missing or deleted.
    DanglingStudent {
        student_id: StudentId,
        course_id: CourseId,
    },
}

/// Result of an audit scan or repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub students_checked: usize,
    pub courses_checked: usize,
    pub drift: Vec<EnrollmentDrift>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty()
    }
}

/// Consistency audit over both collections.
pub struct EnrollmentAudit<S, C, T>
where
    S: StudentRepository,
    C: CourseRepository,
    T: TransactionScope,
{
    students: S,
    courses: C,
    scope: T,
}

impl<S, C, T> EnrollmentAudit<S, C, T>
where
    S: StudentRepository,
    C: CourseRepository,
    T: TransactionScope,
{
    pub fn new(students: S, courses: C, scope: T) -> Self {
        Self {
            students,
            courses,
            scope,
        }
    }

    /// Reports drift without writing anything.
    pub fn scan(&self) -> ServiceResult<AuditReport> {
        let students = self.students.find_many_by_filter(&Filter::Active)?;
        let courses = self.courses.find_many_by_filter(&Filter::Active)?;
        let report = detect_drift(&students, &courses);
        if report.is_consistent() {
            info!(
                "event=enrollment_audit module=service status=ok students={} courses={}",
                report.students_checked, report.courses_checked
            );
        } else {
            warn!(
                "event=enrollment_audit module=service status=drift students={} courses={} drift={}",
                report.students_checked,
                report.courses_checked,
                report.drift.len()
            );
        }
        Ok(report)
    }

    /// Scans, then fixes every drift entry found.
    ///
    /// Returns the report of what was repaired.
    pub fn repair(&self) -> ServiceResult<AuditReport> {
        self.scope.atomically(|| -> ServiceResult<AuditReport> {
            let report = self.scan()?;
            for drift in &report.drift {
                self.fix(*drift)?;
            }
            if !report.is_consistent() {
                info!(
                    "event=enrollment_repair module=service status=ok repaired={}",
                    report.drift.len()
                );
            }
            Ok(report)
        })
    }

    fn fix(&self, drift: EnrollmentDrift) -> ServiceResult<()> {
        match drift {
            EnrollmentDrift::MissingOnCourse {
                student_id,
                course_id,
            } => {
                self.courses.update_by_id(
                    course_id,
                    &CourseUpdate {
                        add_students: vec![student_id],
                        ..CourseUpdate::default()
                    },
                )?;
            }
            EnrollmentDrift::MissingOnStudent {
                student_id,
                course_id,
            } => {
                self.students.update_by_id(
                    student_id,
                    &StudentUpdate {
                        add_courses: vec![course_id],
                        ..StudentUpdate::default()
                    },
                )?;
            }
            EnrollmentDrift::DanglingCourse {
                student_id,
                course_id,
            } => {
                self.students.update_by_id(
                    student_id,
                    &StudentUpdate {
                        remove_courses: vec![course_id],
                        ..StudentUpdate::default()
                    },
                )?;
            }
            EnrollmentDrift::DanglingStudent {
                student_id,
                course_id,
            } => {
                self.courses.update_by_id(
                    course_id,
                    &CourseUpdate {
                        remove_students: vec![student_id],
                        ..CourseUpdate::default()
                    },
                )?;
            }
        }
        Ok(())
    }
}

/// Compares both sides of every link among the given active documents.
pub fn detect_drift(students: &[Student], courses: &[Course]) -> AuditReport {
    let students_by_id: HashMap<StudentId, &Student> =
        students.iter().map(|student| (student.id, student)).collect();
    let courses_by_id: HashMap<CourseId, &Course> =
        courses.iter().map(|course| (course.id, course)).collect();

    let mut drift = Vec::new();
    for student in students {
        for course_id in &student.courses {
            match courses_by_id.get(course_id) {
                Some(course) if course.has_student(student.id) => {}
                Some(_) => drift.push(EnrollmentDrift::MissingOnCourse {
                    student_id: student.id,
                    course_id: *course_id,
                }),
                None => drift.push(EnrollmentDrift::DanglingCourse {
                    student_id: student.id,
                    course_id: *course_id,
                }),
            }
        }
    }
    for course in courses {
        for student_id in &course.enrolled_students {
            match students_by_id.get(student_id) {
                Some(student) if student.is_enrolled_in(course.id) => {}
                Some(_) => drift.push(EnrollmentDrift::MissingOnStudent {
                    student_id: *student_id,
                    course_id: course.id,
                }),
                None => drift.push(EnrollmentDrift::DanglingStudent {
                    student_id: *student_id,
                    course_id: course.id,
                }),
            }
        }
    }

    AuditReport {
        students_checked: students.len(),
        courses_checked: courses.len(),
        drift,
    }
}
