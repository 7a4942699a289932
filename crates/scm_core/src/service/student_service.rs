//! Student use cases, including registration against courses.
//!
//! # Responsibility
//! - Create, read, patch, delete and search students.
//! - Keep `Student.courses` and `Course.enrolled_students` reciprocal.
//!
//! # Invariants
//! - Referenced courses must exist and be active before a link is written.
//! - Link writes touching both collections run in one atomic scope.
//! - `register` rejects a link present on either side; `remove_course` is
//!   idempotent.

use crate::ids::{are_disjoint, CourseId, StudentId};
use crate::model::course::{Course, CourseUpdate};
use crate::model::student::{NewStudent, Student, StudentPatch, StudentUpdate};
use crate::repo::course_repo::CourseRepository;
use crate::repo::filter::Filter;
use crate::repo::student_repo::StudentRepository;
use crate::repo::TransactionScope;
use crate::search::student_search_filter;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::{changed, changed_instant, changed_text, parse_entity_id, parse_id_list};
use log::info;

/// Student use-case service.
pub struct StudentService<S, C, T>
where
    S: StudentRepository,
    C: CourseRepository,
    T: TransactionScope,
{
    students: S,
    courses: C,
    scope: T,
}

impl<S, C, T> StudentService<S, C, T>
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

    /// Creates a student and links it into every referenced course.
    ///
    /// # Errors
    /// - `Duplicate` when `courses` repeats an id or the phone number is taken.
    /// - `NotFound` when any referenced course is missing or deleted; nothing
    ///   is persisted in that case.
    /// - `BadRequest` for malformed ids or an invalid document shape.
    pub fn create_student(&self, input: &NewStudent) -> ServiceResult<Student> {
        let course_ids = parse_id_list(&input.courses, "courses")?;
        let mut student = Student::new(
            input.full_name_en.trim(),
            input.full_name_km.trim(),
            input.date_of_birth,
            input.gender,
            input.phone_number.trim(),
        );
        student.courses = course_ids.clone();
        student.validate()?;

        let created = self.scope.atomically(|| -> ServiceResult<Student> {
            self.ensure_courses_exist(&course_ids)?;
            let created = self.students.create(&student)?;
            if !course_ids.is_empty() {
                self.courses.add_student_to_many(&course_ids, created.id)?;
            }
            Ok(created)
        })?;

        info!(
            "event=student_create module=service status=ok student_id={} courses={}",
            created.id,
            created.courses.len()
        );
        Ok(created)
    }

    pub fn get_student_by_id(&self, id: &str) -> ServiceResult<Student> {
        let student_id = parse_entity_id(id, "student")?;
        Ok(self.students.find_by_id(student_id)?)
    }

    /// Lists active students; an empty collection is `NotFound`.
    pub fn get_all_students(&self) -> ServiceResult<Vec<Student>> {
        Ok(self.students.find_all()?)
    }

    /// Applies a partial update.
    ///
    /// Only fields that differ from the stored value are written. A `courses`
    /// list is merged in (add-to-set) only when none of its ids is already
    /// linked; otherwise the list is ignored. Newly linked courses receive the
    /// student id in the same atomic scope.
    ///
    /// # Errors
    /// - `NoChange` when nothing in the patch differs from the stored student.
    /// - `NotFound` when the student or a newly referenced course is absent.
    /// - `Duplicate` when the new phone number belongs to another student.
    pub fn update_student_by_id(&self, id: &str, patch: &StudentPatch) -> ServiceResult<Student> {
        let student_id = parse_entity_id(id, "student")?;
        let current = self.students.find_by_id(student_id)?;
        let update = student_delta(&current, patch)?;
        if update.is_empty() {
            return Err(ServiceError::NoChange);
        }

        let updated = if update.add_courses.is_empty() {
            self.students.update_by_id(student_id, &update)?
        } else {
            self.scope.atomically(|| -> ServiceResult<Student> {
                self.ensure_courses_exist(&update.add_courses)?;
                let updated = self.students.update_by_id(student_id, &update)?;
                self.courses
                    .add_student_to_many(&update.add_courses, student_id)?;
                Ok(updated)
            })?
        };

        info!(
            "event=student_update module=service status=ok student_id={} linked_courses={}",
            student_id,
            update.add_courses.len()
        );
        Ok(updated)
    }

    pub fn delete_student_by_id(&self, id: &str) -> ServiceResult<()> {
        let student_id = parse_entity_id(id, "student")?;
        self.students.soft_delete(student_id)?;
        info!("event=student_delete module=service status=ok student_id={student_id}");
        Ok(())
    }

    /// Case-insensitive substring search over both names and the phone number.
    pub fn search_students(&self, term: &str) -> ServiceResult<Vec<Student>> {
        let found = self
            .students
            .search_by_filter(&student_search_filter(term))?;
        info!(
            "event=student_search module=service status=ok hits={}",
            found.len()
        );
        Ok(found)
    }

    /// Links a student and a course on both sides.
    ///
    /// # Errors
    /// - `Duplicate` when either side already records the link.
    pub fn register(&self, student_id: &str, course_id: &str) -> ServiceResult<Student> {
        let (student, course) = self.load_pair(student_id, course_id)?;
        if student.is_enrolled_in(course.id) || course.has_student(student.id) {
            return Err(ServiceError::duplicate(
                "Student already registered in this course!",
            ));
        }

        let updated = self.scope.atomically(|| -> ServiceResult<Student> {
            let updated = self.students.update_by_id(
                student.id,
                &StudentUpdate {
                    add_courses: vec![course.id],
                    ..StudentUpdate::default()
                },
            )?;
            self.courses.update_by_id(
                course.id,
                &CourseUpdate {
                    add_students: vec![student.id],
                    ..CourseUpdate::default()
                },
            )?;
            Ok(updated)
        })?;

        info!(
            "event=student_register module=service status=ok student_id={} course_id={}",
            student.id, course.id
        );
        Ok(updated)
    }

    /// Unlinks a student and a course on both sides; a missing link is not an
    /// error.
    pub fn remove_course(&self, student_id: &str, course_id: &str) -> ServiceResult<Student> {
        let (student, course) = self.load_pair(student_id, course_id)?;

        let updated = self.scope.atomically(|| -> ServiceResult<Student> {
            let updated = self.students.update_by_id(
                student.id,
                &StudentUpdate {
                    remove_courses: vec![course.id],
                    ..StudentUpdate::default()
                },
            )?;
            self.courses.update_by_id(
                course.id,
                &CourseUpdate {
                    remove_students: vec![student.id],
                    ..CourseUpdate::default()
                },
            )?;
            Ok(updated)
        })?;

        info!(
            "event=student_remove_course module=service status=ok student_id={} course_id={}",
            student.id, course.id
        );
        Ok(updated)
    }

    fn load_pair(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> ServiceResult<(Student, Course)> {
        let student_id: StudentId = parse_entity_id(student_id, "student")?;
        let course_id: CourseId = parse_entity_id(course_id, "course")?;
        let student = self.students.find_by_id(student_id)?;
        let course = self.courses.find_by_id(course_id)?;
        Ok((student, course))
    }

    fn ensure_courses_exist(&self, course_ids: &[CourseId]) -> ServiceResult<()> {
        if course_ids.is_empty() {
            return Ok(());
        }
        let found = self
            .courses
            .find_many_by_filter(&Filter::IdIn(course_ids.to_vec()).and_active())?;
        if found.len() != course_ids.len() {
            return Err(ServiceError::not_found("One or more courses not found!"));
        }
        Ok(())
    }
}

fn student_delta(current: &Student, patch: &StudentPatch) -> ServiceResult<StudentUpdate> {
    let add_courses = match patch.courses.as_deref() {
        Some(requested) if !requested.is_empty() => {
            let requested = parse_id_list(requested, "courses")?;
            if are_disjoint(Some(requested.as_slice()), Some(current.courses.as_slice())) {
                requested
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    };

    Ok(StudentUpdate {
        full_name_en: changed_text(patch.full_name_en.as_ref(), &current.full_name_en),
        full_name_km: changed_text(patch.full_name_km.as_ref(), &current.full_name_km),
        date_of_birth: changed_instant(patch.date_of_birth, current.date_of_birth),
        gender: changed(patch.gender, current.gender),
        phone_number: changed_text(patch.phone_number.as_ref(), &current.phone_number),
        add_courses,
        remove_courses: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::student_delta;
    use crate::model::student::{Gender, Student, StudentPatch};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample() -> Student {
        let mut student = Student::new(
            "Sok Dara",
            "សុខ ដារា",
            Utc.with_ymd_and_hms(2001, 5, 4, 0, 0, 0).unwrap(),
            Gender::Male,
            "012 345 678",
        );
        student.courses = vec![Uuid::new_v4()];
        student
    }

    #[test]
    fn delta_keeps_only_changed_fields() {
        let student = sample();
        let patch = StudentPatch {
            full_name_en: Some("Sok Dara".to_string()),
            gender: Some(Gender::Female),
            date_of_birth: Some(student.date_of_birth),
            ..StudentPatch::default()
        };
        let update = student_delta(&student, &patch).unwrap();
        assert_eq!(update.full_name_en, None);
        assert_eq!(update.date_of_birth, None);
        assert_eq!(update.gender, Some(Gender::Female));
    }

    #[test]
    fn overlapping_course_list_is_ignored() {
        let student = sample();
        let patch = StudentPatch {
            courses: Some(vec![student.courses[0].to_string(), Uuid::new_v4().to_string()]),
            ..StudentPatch::default()
        };
        let update = student_delta(&student, &patch).unwrap();
        assert!(update.add_courses.is_empty());
        assert!(update.is_empty());
    }

    #[test]
    fn disjoint_course_list_is_merged() {
        let student = sample();
        let fresh = Uuid::new_v4();
        let patch = StudentPatch {
            courses: Some(vec![fresh.to_string()]),
            ..StudentPatch::default()
        };
        let update = student_delta(&student, &patch).unwrap();
        assert_eq!(update.add_courses, vec![fresh]);
    }
}
