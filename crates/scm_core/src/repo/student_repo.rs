//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and predicate queries over the `students` collection.
//! - Enforce phone-number uniqueness among active students.
//!
//! # Invariants
//! - Writes call `Student::validate()` before SQL mutations.
//! - `find_by_id`, `find_all`, `update_by_id`, `soft_delete` and
//!   `search_by_filter` only see active rows.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::ids::{CourseId, StudentId};
use crate::model::student::{Gender, Student, StudentUpdate};
use crate::report::StudentReportRow;
use crate::repo::filter::{Filter, StudentField};
use crate::repo::rows::{
    bool_to_int, encode_id_list, is_unique_violation, parse_id_list, parse_instant,
    parse_is_deleted, parse_uuid,
};
use crate::repo::{RepoError, RepoResult};
use log::error;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const STUDENT_SELECT_SQL: &str = "SELECT
    uuid,
    full_name_en,
    full_name_km,
    date_of_birth,
    gender,
    phone_number,
    courses,
    is_deleted,
    create_at
FROM students";

const PHONE_TAKEN_MESSAGE: &str = "Invalid phone number!";

/// Repository interface for the students collection.
pub trait StudentRepository {
    /// Persists a new student and returns the stored document.
    fn create(&self, student: &Student) -> RepoResult<Student>;
    /// Loads one active student.
    fn find_by_id(&self, id: StudentId) -> RepoResult<Student>;
    /// Lists active students; an empty collection is reported as `NotFound`.
    fn find_all(&self) -> RepoResult<Vec<Student>>;
    /// Applies a merge-patch delta to one active student.
    fn update_by_id(&self, id: StudentId, update: &StudentUpdate) -> RepoResult<Student>;
    /// Flags one active student as deleted.
    fn soft_delete(&self, id: StudentId) -> RepoResult<()>;
    /// Returns the first match, deleted rows included unless filtered out.
    fn find_one_by_filter(&self, filter: &Filter<StudentField>) -> RepoResult<Option<Student>>;
    /// Returns every match, deleted rows included unless filtered out.
    fn find_many_by_filter(&self, filter: &Filter<StudentField>) -> RepoResult<Vec<Student>>;
    /// Returns active matches; zero matches is reported as `NotFound`.
    fn search_by_filter(&self, filter: &Filter<StudentField>) -> RepoResult<Vec<Student>>;
    /// Adds `course_id` to the course list of every listed active student.
    ///
    /// Returns the number of students touched.
    fn add_course_to_many(&self, student_ids: &[StudentId], course_id: CourseId)
        -> RepoResult<usize>;
    /// One summary row per active student.
    fn report(&self) -> RepoResult<Vec<StudentReportRow>>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn ensure_phone_available(&self, phone_number: &str, except: StudentId) -> RepoResult<()> {
        let filter = Filter::And(vec![
            Filter::Equals(StudentField::PhoneNumber, phone_number.trim().to_string()),
            Filter::IdNot(except),
            Filter::Active,
        ]);
        if self.find_one_by_filter(&filter)?.is_some() {
            return Err(RepoError::Duplicate(PHONE_TAKEN_MESSAGE.to_string()));
        }
        Ok(())
    }

    fn write(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;
        let changed = self
            .conn
            .execute(
                "UPDATE students
                 SET
                    full_name_en = ?1,
                    full_name_km = ?2,
                    date_of_birth = ?3,
                    gender = ?4,
                    phone_number = ?5,
                    courses = ?6,
                    is_deleted = ?7,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?8;",
                params![
                    student.full_name_en.trim(),
                    student.full_name_km.trim(),
                    student.date_of_birth.timestamp_millis(),
                    student.gender.as_str(),
                    student.phone_number.trim(),
                    encode_id_list(&student.courses)?,
                    bool_to_int(student.is_deleted),
                    student.id.to_string(),
                ],
            )
            .map_err(map_write_error)?;

        if changed == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    fn query(
        &self,
        filter: &Filter<StudentField>,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Student>> {
        let (where_sql, mut binds) = filter.to_sql();
        let mut sql =
            format!("{STUDENT_SELECT_SQL} WHERE {where_sql} ORDER BY create_at ASC, uuid ASC");
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create(&self, student: &Student) -> RepoResult<Student> {
        student.validate()?;
        self.ensure_phone_available(&student.phone_number, student.id)?;

        self.conn
            .execute(
                "INSERT INTO students (
                    uuid,
                    full_name_en,
                    full_name_km,
                    date_of_birth,
                    gender,
                    phone_number,
                    courses,
                    is_deleted,
                    create_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8);",
                params![
                    student.id.to_string(),
                    student.full_name_en.trim(),
                    student.full_name_km.trim(),
                    student.date_of_birth.timestamp_millis(),
                    student.gender.as_str(),
                    student.phone_number.trim(),
                    encode_id_list(&student.courses)?,
                    student.created_at.timestamp_millis(),
                ],
            )
            .map_err(map_write_error)?;

        self.find_by_id(student.id)
    }

    fn find_by_id(&self, id: StudentId) -> RepoResult<Student> {
        let filter = Filter::IdIn(vec![id]).and_active();
        self.find_one_by_filter(&filter)?.ok_or_else(not_found)
    }

    fn find_all(&self) -> RepoResult<Vec<Student>> {
        let students = self.find_many_by_filter(&Filter::Active)?;
        if students.is_empty() {
            return Err(RepoError::NotFound("No students found".to_string()));
        }
        Ok(students)
    }

    fn update_by_id(&self, id: StudentId, update: &StudentUpdate) -> RepoResult<Student> {
        let mut student = self.find_by_id(id)?;
        if let Some(phone_number) = update.phone_number.as_deref() {
            self.ensure_phone_available(phone_number, id)?;
        }
        student.apply(update);
        self.write(&student)?;
        self.find_by_id(id)
    }

    fn soft_delete(&self, id: StudentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE students
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(
                "No student found with the provided ID!".to_string(),
            ));
        }
        Ok(())
    }

    fn find_one_by_filter(&self, filter: &Filter<StudentField>) -> RepoResult<Option<Student>> {
        let mut students = self.query(filter, Some(1))?;
        Ok(students.pop())
    }

    fn find_many_by_filter(&self, filter: &Filter<StudentField>) -> RepoResult<Vec<Student>> {
        self.query(filter, None)
    }

    fn search_by_filter(&self, filter: &Filter<StudentField>) -> RepoResult<Vec<Student>> {
        let students = self.find_many_by_filter(&filter.clone().and_active())?;
        if students.is_empty() {
            return Err(RepoError::NotFound("Can not find student!".to_string()));
        }
        Ok(students)
    }

    fn add_course_to_many(
        &self,
        student_ids: &[StudentId],
        course_id: CourseId,
    ) -> RepoResult<usize> {
        let targets = self.find_many_by_filter(&Filter::IdIn(student_ids.to_vec()).and_active())?;
        let update = StudentUpdate {
            add_courses: vec![course_id],
            ..StudentUpdate::default()
        };
        for mut student in targets.iter().cloned() {
            student.apply(&update);
            self.write(&student)?;
        }
        Ok(targets.len())
    }

    fn report(&self) -> RepoResult<Vec<StudentReportRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                full_name_en,
                full_name_km,
                date_of_birth,
                gender,
                phone_number,
                json_array_length(COALESCE(courses, '[]')) AS number_of_courses
             FROM students
             WHERE is_deleted = 0
             ORDER BY create_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut report = Vec::new();
        while let Some(row) = rows.next()? {
            report.push(StudentReportRow {
                id: parse_uuid(row, "students")?,
                full_name_en: row.get("full_name_en")?,
                full_name_km: row.get("full_name_km")?,
                date_of_birth: parse_instant(row, "date_of_birth")?,
                gender: parse_gender(row)?,
                phone_number: row.get("phone_number")?,
                number_of_courses: row.get("number_of_courses")?,
            });
        }
        Ok(report)
    }
}

fn not_found() -> RepoError {
    RepoError::NotFound("No student found with the specific ID!".to_string())
}

fn map_write_error(err: rusqlite::Error) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::Duplicate(PHONE_TAKEN_MESSAGE.to_string());
    }
    error!("event=student_write module=repo status=error error={err}");
    RepoError::from(err)
}

fn parse_gender(row: &Row<'_>) -> RepoResult<Gender> {
    let text: String = row.get("gender")?;
    Gender::parse(&text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid gender `{text}` in students.gender")))
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let student = Student {
        id: parse_uuid(row, "students")?,
        full_name_en: row.get("full_name_en")?,
        full_name_km: row.get("full_name_km")?,
        date_of_birth: parse_instant(row, "date_of_birth")?,
        gender: parse_gender(row)?,
        phone_number: row.get("phone_number")?,
        courses: parse_id_list(row, "courses")?,
        is_deleted: parse_is_deleted(row)?,
        created_at: parse_instant(row, "create_at")?,
    };
    student
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("student {}: {err}", student.id)))?;
    Ok(student)
}
