//! Student document model.
//!
//! # Invariants
//! - `courses` holds each course id at most once.
//! - `phone_number` is unique among active students (enforced by storage).
//! - `is_deleted` is the source of truth for tombstone state.

use crate::ids::{has_duplicates, CourseId, StudentId};
use crate::model::now_millis;
use crate::model::validation::{require_phone, require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Student gender as accepted by the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Storage/wire text for this value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    /// Parses storage/wire text.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Canonical student document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Stable id, serialized as `_id` to match the document wire shape.
    #[serde(rename = "_id")]
    pub id: StudentId,
    /// Full name, English spelling.
    pub full_name_en: String,
    /// Full name, Khmer spelling.
    pub full_name_km: String,
    pub date_of_birth: DateTime<Utc>,
    pub gender: Gender,
    pub phone_number: String,
    /// Enrolled course ids in enrollment order.
    pub courses: Vec<CourseId>,
    pub is_deleted: bool,
    #[serde(rename = "create_at")]
    pub created_at: DateTime<Utc>,
}

/// Create command for one student.
///
/// Course ids arrive as text from the transport layer and are parsed by the
/// service so malformed ids can be reported as bad requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub full_name_en: String,
    pub full_name_km: String,
    pub date_of_birth: DateTime<Utc>,
    pub gender: Gender,
    pub phone_number: String,
    #[serde(default)]
    pub courses: Vec<String>,
}

/// Partial update command: only present fields are considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPatch {
    pub full_name_en: Option<String>,
    pub full_name_km: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub courses: Option<Vec<String>>,
}

/// Minimal field delta applied by storage with merge-patch semantics.
///
/// `add_courses` is an add-to-set merge; `remove_courses` filters ids out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentUpdate {
    pub full_name_en: Option<String>,
    pub full_name_km: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub add_courses: Vec<CourseId>,
    pub remove_courses: Vec<CourseId>,
}

impl StudentUpdate {
    /// Returns whether this delta carries no change at all.
    pub fn is_empty(&self) -> bool {
        self.full_name_en.is_none()
            && self.full_name_km.is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
            && self.phone_number.is_none()
            && self.add_courses.is_empty()
            && self.remove_courses.is_empty()
    }
}

impl Student {
    /// Creates an active student with a generated id and no courses.
    pub fn new(
        full_name_en: impl Into<String>,
        full_name_km: impl Into<String>,
        date_of_birth: DateTime<Utc>,
        gender: Gender,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name_en: full_name_en.into(),
            full_name_km: full_name_km.into(),
            date_of_birth,
            gender,
            phone_number: phone_number.into(),
            courses: Vec::new(),
            is_deleted: false,
            created_at: now_millis(),
        }
    }

    /// Validates document shape before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("full_name_en", &self.full_name_en)?;
        require_text("full_name_km", &self.full_name_km)?;
        require_phone(&self.phone_number)?;
        if has_duplicates(&self.courses) {
            return Err(ValidationError::DuplicateIds("courses"));
        }
        Ok(())
    }

    /// Applies a field delta in place.
    ///
    /// Added course ids already present are skipped; removed ids are filtered
    /// out wherever they appear.
    pub fn apply(&mut self, update: &StudentUpdate) {
        if let Some(value) = &update.full_name_en {
            self.full_name_en = value.clone();
        }
        if let Some(value) = &update.full_name_km {
            self.full_name_km = value.clone();
        }
        if let Some(value) = update.date_of_birth {
            self.date_of_birth = value;
        }
        if let Some(value) = update.gender {
            self.gender = value;
        }
        if let Some(value) = &update.phone_number {
            self.phone_number = value.clone();
        }
        for course_id in &update.add_courses {
            if !self.courses.contains(course_id) {
                self.courses.push(*course_id);
            }
        }
        if !update.remove_courses.is_empty() {
            self.courses
                .retain(|course_id| !update.remove_courses.contains(course_id));
        }
    }

    /// Returns whether this student is linked to `course_id`.
    pub fn is_enrolled_in(&self, course_id: CourseId) -> bool {
        self.courses.contains(&course_id)
    }

    /// Returns whether this document should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
