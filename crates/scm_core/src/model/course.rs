//! Course document model.
//!
//! # Invariants
//! - `enrolled_students` holds each student id at most once.
//! - `end_date` is never earlier than `start_date`.
//! - `limit_number_of_students` is positive.

use crate::ids::{has_duplicates, CourseId, StudentId};
use crate::model::now_millis;
use crate::model::validation::{require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical course document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: CourseId,
    pub name: String,
    pub professor_name: String,
    /// Capacity limit. Stored but not enforced at registration.
    pub limit_number_of_students: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Enrolled student ids in enrollment order.
    pub enrolled_students: Vec<StudentId>,
    pub is_deleted: bool,
    #[serde(rename = "create_at")]
    pub created_at: DateTime<Utc>,
}

/// Create command for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub professor_name: String,
    pub limit_number_of_students: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub enrolled_students: Vec<String>,
}

/// Partial update command: only present fields are considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub professor_name: Option<String>,
    pub limit_number_of_students: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub enrolled_students: Option<Vec<String>>,
}

/// Minimal field delta applied by storage with merge-patch semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    pub name: Option<String>,
    pub professor_name: Option<String>,
    pub limit_number_of_students: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub add_students: Vec<StudentId>,
    pub remove_students: Vec<StudentId>,
}

impl CourseUpdate {
    /// Returns whether this delta carries no change at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.professor_name.is_none()
            && self.limit_number_of_students.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.add_students.is_empty()
            && self.remove_students.is_empty()
    }
}

impl Course {
    /// Creates an active course with a generated id and no enrolled students.
    pub fn new(
        name: impl Into<String>,
        professor_name: impl Into<String>,
        limit_number_of_students: u32,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            professor_name: professor_name.into(),
            limit_number_of_students,
            start_date,
            end_date,
            enrolled_students: Vec::new(),
            is_deleted: false,
            created_at: now_millis(),
        }
    }

    /// Validates document shape before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("professor_name", &self.professor_name)?;
        if self.limit_number_of_students == 0 {
            return Err(ValidationError::NonPositiveLimit);
        }
        if self.end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart);
        }
        if has_duplicates(&self.enrolled_students) {
            return Err(ValidationError::DuplicateIds("enrolled_students"));
        }
        Ok(())
    }

    /// Applies a field delta in place with add-to-set/filter list semantics.
    pub fn apply(&mut self, update: &CourseUpdate) {
        if let Some(value) = &update.name {
            self.name = value.clone();
        }
        if let Some(value) = &update.professor_name {
            self.professor_name = value.clone();
        }
        if let Some(value) = update.limit_number_of_students {
            self.limit_number_of_students = value;
        }
        if let Some(value) = update.start_date {
            self.start_date = value;
        }
        if let Some(value) = update.end_date {
            self.end_date = value;
        }
        for student_id in &update.add_students {
            if !self.enrolled_students.contains(student_id) {
                self.enrolled_students.push(*student_id);
            }
        }
        if !update.remove_students.is_empty() {
            self.enrolled_students
                .retain(|student_id| !update.remove_students.contains(student_id));
        }
    }

    /// Returns whether `student_id` is on the enrolled list.
    pub fn has_student(&self, student_id: StudentId) -> bool {
        self.enrolled_students.contains(&student_id)
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
