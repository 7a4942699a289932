//! Course use cases.
//!
//! # Responsibility
//! - Create, read, patch, delete and search courses.
//! - Mirror the student-side linking rules for `enrolled_students`.
//!
//! # Invariants
//! - Referenced students must exist and be active before a link is written.
//! - Link writes touching both collections run in one atomic scope.

use crate::ids::{are_disjoint, StudentId};
use crate::model::course::{Course, CoursePatch, CourseUpdate, NewCourse};
use crate::repo::course_repo::CourseRepository;
use crate::repo::filter::Filter;
use crate::repo::student_repo::StudentRepository;
use crate::repo::TransactionScope;
use crate::search::{course_date_range_filter, course_search_filter, CourseDateRange};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::{changed, changed_instant, changed_text, parse_entity_id, parse_id_list};
use log::info;

/// Course use-case service.
pub struct CourseService<C, S, T>
where
    C: CourseRepository,
    S: StudentRepository,
    T: TransactionScope,
{
    courses: C,
    students: S,
    scope: T,
}

impl<C, S, T> CourseService<C, S, T>
where
    C: CourseRepository,
    S: StudentRepository,
    T: TransactionScope,
{
    pub fn new(courses: C, students: S, scope: T) -> Self {
        Self {
            courses,
            students,
            scope,
        }
    }

    /// Creates a course and links it into every referenced student.
    ///
    /// Referenced students are resolved first, the same way student creation
    /// resolves courses.
    ///
    /// # Errors
    /// - `Duplicate` when `enrolled_students` repeats an id.
    /// - `NotFound` when any referenced student is missing or deleted.
    /// - `BadRequest` for malformed ids or an invalid document shape.
    pub fn create_course(&self, input: &NewCourse) -> ServiceResult<Course> {
        let student_ids = parse_id_list(&input.enrolled_students, "enrolled_students")?;
        let mut course = Course::new(
            input.name.trim(),
            input.professor_name.trim(),
            input.limit_number_of_students,
            input.start_date,
            input.end_date,
        );
        course.enrolled_students = student_ids.clone();
        course.validate()?;

        let created = self.scope.atomically(|| -> ServiceResult<Course> {
            self.ensure_students_exist(&student_ids)?;
            let created = self.courses.create(&course)?;
            if !student_ids.is_empty() {
                self.students.add_course_to_many(&student_ids, created.id)?;
            }
            Ok(created)
        })?;

        info!(
            "event=course_create module=service status=ok course_id={} students={}",
            created.id,
            created.enrolled_students.len()
        );
        Ok(created)
    }

    pub fn get_course_by_id(&self, id: &str) -> ServiceResult<Course> {
        let course_id = parse_entity_id(id, "course")?;
        Ok(self.courses.find_by_id(course_id)?)
    }

    /// Lists active courses; an empty collection is `NotFound`.
    pub fn get_all_courses(&self) -> ServiceResult<Vec<Course>> {
        Ok(self.courses.find_all()?)
    }

    /// Applies a partial update with the same delta rules as student updates.
    ///
    /// An `enrolled_students` list is merged only when disjoint from the
    /// stored list; newly linked students receive the course id atomically.
    pub fn update_course_by_id(&self, id: &str, patch: &CoursePatch) -> ServiceResult<Course> {
        let course_id = parse_entity_id(id, "course")?;
        let current = self.courses.find_by_id(course_id)?;
        let update = course_delta(&current, patch)?;
        if update.is_empty() {
            return Err(ServiceError::NoChange);
        }

        let updated = if update.add_students.is_empty() {
            self.courses.update_by_id(course_id, &update)?
        } else {
            self.scope.atomically(|| -> ServiceResult<Course> {
                self.ensure_students_exist(&update.add_students)?;
                let updated = self.courses.update_by_id(course_id, &update)?;
                self.students
                    .add_course_to_many(&update.add_students, course_id)?;
                Ok(updated)
            })?
        };

        info!(
            "event=course_update module=service status=ok course_id={} linked_students={}",
            course_id,
            update.add_students.len()
        );
        Ok(updated)
    }

    pub fn delete_course_by_id(&self, id: &str) -> ServiceResult<()> {
        let course_id = parse_entity_id(id, "course")?;
        self.courses.soft_delete(course_id)?;
        info!("event=course_delete module=service status=ok course_id={course_id}");
        Ok(())
    }

    /// Case-insensitive substring search over the course name.
    pub fn search_courses(&self, term: &str) -> ServiceResult<Vec<Course>> {
        let found = self.courses.search_by_filter(&course_search_filter(term))?;
        info!(
            "event=course_search module=service status=ok hits={}",
            found.len()
        );
        Ok(found)
    }

    /// Date-bound search.
    ///
    /// Each supplied bound adds one clause and the clauses are OR-ed: with
    /// both bounds the result is the union of courses starting on/after
    /// `start_date` and courses ending on/before `end_date`.
    ///
    /// # Errors
    /// - `BadRequest` when neither bound is supplied.
    /// - `NotFound` when nothing matches.
    pub fn advance_search_courses(&self, range: &CourseDateRange) -> ServiceResult<Vec<Course>> {
        if range.is_unbounded() {
            return Err(ServiceError::bad_request(
                "At least one of start_date or end_date is required!",
            ));
        }
        let found = self
            .courses
            .search_by_filter(&course_date_range_filter(range))?;
        info!(
            "event=course_advance_search module=service status=ok hits={} has_start={} has_end={}",
            found.len(),
            range.start_date.is_some(),
            range.end_date.is_some()
        );
        Ok(found)
    }

    fn ensure_students_exist(&self, student_ids: &[StudentId]) -> ServiceResult<()> {
        if student_ids.is_empty() {
            return Ok(());
        }
        let found = self
            .students
            .find_many_by_filter(&Filter::IdIn(student_ids.to_vec()).and_active())?;
        if found.len() != student_ids.len() {
            return Err(ServiceError::not_found("One or more students not found!"));
        }
        Ok(())
    }
}

fn course_delta(current: &Course, patch: &CoursePatch) -> ServiceResult<CourseUpdate> {
    let add_students = match patch.enrolled_students.as_deref() {
        Some(requested) if !requested.is_empty() => {
            let requested = parse_id_list(requested, "enrolled_students")?;
            if are_disjoint(
                Some(requested.as_slice()),
                Some(current.enrolled_students.as_slice()),
            ) {
                requested
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };

    Ok(CourseUpdate {
        name: changed_text(patch.name.as_ref(), &current.name),
        professor_name: changed_text(patch.professor_name.as_ref(), &current.professor_name),
        limit_number_of_students: changed(
            patch.limit_number_of_students,
            current.limit_number_of_students,
        ),
        start_date: changed_instant(patch.start_date, current.start_date),
        end_date: changed_instant(patch.end_date, current.end_date),
        add_students,
        remove_students: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::course_delta;
    use crate::model::course::{Course, CoursePatch};
    use crate::service::error::ErrorKind;
    use chrono::{TimeZone, Utc};

    fn sample() -> Course {
        Course::new(
            "Math 101",
            "Dr. Chan",
            30,
            Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 12, 15, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn equal_dates_are_not_changes() {
        let course = sample();
        let patch = CoursePatch {
            start_date: Some(course.start_date),
            limit_number_of_students: Some(40),
            ..CoursePatch::default()
        };
        let update = course_delta(&course, &patch).unwrap();
        assert_eq!(update.start_date, None);
        assert_eq!(update.limit_number_of_students, Some(40));
    }

    #[test]
    fn empty_enrolled_list_is_no_change() {
        let course = sample();
        let patch = CoursePatch {
            enrolled_students: Some(Vec::new()),
            ..CoursePatch::default()
        };
        assert!(course_delta(&course, &patch).unwrap().is_empty());
    }

    #[test]
    fn repeated_enrolled_ids_are_duplicate() {
        let course = sample();
        let id = uuid::Uuid::new_v4().to_string();
        let patch = CoursePatch {
            enrolled_students: Some(vec![id.clone(), id]),
            ..CoursePatch::default()
        };
        let err = course_delta(&course, &patch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }
}
