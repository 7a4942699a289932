//! Denormalized summary rows for tabular reporting.
//!
//! # Invariants
//! - One row per active document; soft-deleted documents never appear.
//! - Relationship counts are the length of the stored id list.

use crate::ids::{CourseId, StudentId};
use crate::model::student::Gender;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which collection a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student,
    Course,
}

/// Student summary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentReportRow {
    #[serde(rename = "_id")]
    pub id: StudentId,
    pub full_name_en: String,
    pub full_name_km: String,
    pub date_of_birth: DateTime<Utc>,
    pub gender: Gender,
    pub phone_number: String,
    pub number_of_courses: u32,
}

/// Course summary row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseReportRow {
    #[serde(rename = "_id")]
    pub id: CourseId,
    pub name: String,
    pub professor_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub limit_number_of_students: u32,
    pub number_of_registered_students: u32,
}

/// Report for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "rows", rename_all = "snake_case")]
pub enum Report {
    Students(Vec<StudentReportRow>),
    Courses(Vec<CourseReportRow>),
}

impl Report {
    /// Number of summary rows.
    pub fn len(&self) -> usize {
        match self {
            Self::Students(rows) => rows.len(),
            Self::Courses(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
