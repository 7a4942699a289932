//! Course repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Writes call `Course::validate()` before SQL mutations.
//! - Only active rows are visible to id lookups, listing, updates and search.

use crate::ids::{CourseId, StudentId};
use crate::model::course::{Course, CourseUpdate};
use crate::report::CourseReportRow;
use crate::repo::filter::{CourseField, Filter};
use crate::repo::rows::{
    bool_to_int, encode_id_list, parse_id_list, parse_instant, parse_is_deleted, parse_uuid,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const COURSE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    professor_name,
    limit_number_of_students,
    start_date,
    end_date,
    enrolled_students,
    is_deleted,
    create_at
FROM courses";

/// Repository interface for the courses collection.
pub trait CourseRepository {
    fn create(&self, course: &Course) -> RepoResult<Course>;
    fn find_by_id(&self, id: CourseId) -> RepoResult<Course>;
    /// Lists active courses; an empty collection is reported as `NotFound`.
    fn find_all(&self) -> RepoResult<Vec<Course>>;
    fn update_by_id(&self, id: CourseId, update: &CourseUpdate) -> RepoResult<Course>;
    fn soft_delete(&self, id: CourseId) -> RepoResult<()>;
    fn find_one_by_filter(&self, filter: &Filter<CourseField>) -> RepoResult<Option<Course>>;
    fn find_many_by_filter(&self, filter: &Filter<CourseField>) -> RepoResult<Vec<Course>>;
    /// Returns active matches; zero matches is reported as `NotFound`.
    fn search_by_filter(&self, filter: &Filter<CourseField>) -> RepoResult<Vec<Course>>;
    /// Adds `student_id` to the enrolled list of every listed active course.
    fn add_student_to_many(&self, course_ids: &[CourseId], student_id: StudentId)
        -> RepoResult<usize>;
    fn report(&self) -> RepoResult<Vec<CourseReportRow>>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write(&self, course: &Course) -> RepoResult<()> {
        course.validate()?;
        let changed = self.conn.execute(
            "UPDATE courses
             SET
                name = ?1,
                professor_name = ?2,
                limit_number_of_students = ?3,
                start_date = ?4,
                end_date = ?5,
                enrolled_students = ?6,
                is_deleted = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?8;",
            params![
                course.name.trim(),
                course.professor_name.trim(),
                course.limit_number_of_students,
                course.start_date.timestamp_millis(),
                course.end_date.timestamp_millis(),
                encode_id_list(&course.enrolled_students)?,
                bool_to_int(course.is_deleted),
                course.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    fn query(&self, filter: &Filter<CourseField>, limit: Option<u32>) -> RepoResult<Vec<Course>> {
        let (where_sql, mut binds) = filter.to_sql();
        let mut sql =
            format!("{COURSE_SELECT_SQL} WHERE {where_sql} ORDER BY create_at ASC, uuid ASC");
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            courses.push(parse_course_row(row)?);
        }
        Ok(courses)
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn create(&self, course: &Course) -> RepoResult<Course> {
        course.validate()?;

        self.conn.execute(
            "INSERT INTO courses (
                uuid,
                name,
                professor_name,
                limit_number_of_students,
                start_date,
                end_date,
                enrolled_students,
                is_deleted,
                create_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8);",
            params![
                course.id.to_string(),
                course.name.trim(),
                course.professor_name.trim(),
                course.limit_number_of_students,
                course.start_date.timestamp_millis(),
                course.end_date.timestamp_millis(),
                encode_id_list(&course.enrolled_students)?,
                course.created_at.timestamp_millis(),
            ],
        )?;

        self.find_by_id(course.id)
    }

    fn find_by_id(&self, id: CourseId) -> RepoResult<Course> {
        let filter = Filter::IdIn(vec![id]).and_active();
        self.find_one_by_filter(&filter)?.ok_or_else(not_found)
    }

    fn find_all(&self) -> RepoResult<Vec<Course>> {
        let courses = self.find_many_by_filter(&Filter::Active)?;
        if courses.is_empty() {
            return Err(RepoError::NotFound("No courses found!".to_string()));
        }
        Ok(courses)
    }

    fn update_by_id(&self, id: CourseId, update: &CourseUpdate) -> RepoResult<Course> {
        let mut course = self.find_by_id(id)?;
        course.apply(update);
        self.write(&course)?;
        self.find_by_id(id)
    }

    fn soft_delete(&self, id: CourseId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE courses
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(
                "No course found with the provided ID!".to_string(),
            ));
        }
        Ok(())
    }

    fn find_one_by_filter(&self, filter: &Filter<CourseField>) -> RepoResult<Option<Course>> {
        let mut courses = self.query(filter, Some(1))?;
        Ok(courses.pop())
    }

    fn find_many_by_filter(&self, filter: &Filter<CourseField>) -> RepoResult<Vec<Course>> {
        self.query(filter, None)
    }

    fn search_by_filter(&self, filter: &Filter<CourseField>) -> RepoResult<Vec<Course>> {
        let courses = self.find_many_by_filter(&filter.clone().and_active())?;
        if courses.is_empty() {
            return Err(RepoError::NotFound("Can not find course!".to_string()));
        }
        Ok(courses)
    }

    fn add_student_to_many(
        &self,
        course_ids: &[CourseId],
        student_id: StudentId,
    ) -> RepoResult<usize> {
        let targets = self.find_many_by_filter(&Filter::IdIn(course_ids.to_vec()).and_active())?;
        let update = CourseUpdate {
            add_students: vec![student_id],
            ..CourseUpdate::default()
        };
        for mut course in targets.iter().cloned() {
            course.apply(&update);
            self.write(&course)?;
        }
        Ok(targets.len())
    }

    fn report(&self) -> RepoResult<Vec<CourseReportRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                name,
                professor_name,
                start_date,
                end_date,
                limit_number_of_students,
                json_array_length(COALESCE(enrolled_students, '[]'))
                    AS number_of_registered_students
             FROM courses
             WHERE is_deleted = 0
             ORDER BY create_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut report = Vec::new();
        while let Some(row) = rows.next()? {
            report.push(CourseReportRow {
                id: parse_uuid(row, "courses")?,
                name: row.get("name")?,
                professor_name: row.get("professor_name")?,
                start_date: parse_instant(row, "start_date")?,
                end_date: parse_instant(row, "end_date")?,
                limit_number_of_students: row.get("limit_number_of_students")?,
                number_of_registered_students: row.get("number_of_registered_students")?,
            });
        }
        Ok(report)
    }
}

fn not_found() -> RepoError {
    RepoError::NotFound("No course found with the specific ID!".to_string())
}

fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    let course = Course {
        id: parse_uuid(row, "courses")?,
        name: row.get("name")?,
        professor_name: row.get("professor_name")?,
        limit_number_of_students: row.get("limit_number_of_students")?,
        start_date: parse_instant(row, "start_date")?,
        end_date: parse_instant(row, "end_date")?,
        enrolled_students: parse_id_list(row, "enrolled_students")?,
        is_deleted: parse_is_deleted(row)?,
        created_at: parse_instant(row, "create_at")?,
    };
    course
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("course {}: {err}", course.id)))?;
    Ok(course)
}
