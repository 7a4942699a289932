//! Typed predicate language for document queries.
//!
//! # Responsibility
//! - Describe per-collection predicates without leaking SQL to services.
//! - Compile predicates into parameterized `WHERE` fragments.
//!
//! # Invariants
//! - Caller-supplied text is always bound, never interpolated.
//! - An empty `Or` matches nothing; an empty `And` matches everything.

use crate::db::UNICODE_LOWER_FN;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use uuid::Uuid;

/// Queryable field of one collection.
pub trait FilterField: Copy {
    fn column(self) -> &'static str;
}

/// Predicate over one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<F> {
    /// Document id is one of the given ids.
    ///
    /// Binds one parameter per id, so a list is bounded by SQLite's host
    /// parameter limit (32766 for the bundled build) minus the other binds.
    IdIn(Vec<Uuid>),
    /// Document id differs from the given id.
    IdNot(Uuid),
    /// Document is not soft-deleted.
    Active,
    /// Exact text match.
    Equals(F, String),
    /// Case-insensitive substring match, folded with Unicode lowercase rules
    /// on both sides.
    ContainsIgnoreCase(F, String),
    /// Instant field is at or after the bound.
    OnOrAfter(F, DateTime<Utc>),
    /// Instant field is at or before the bound.
    OnOrBefore(F, DateTime<Utc>),
    And(Vec<Filter<F>>),
    Or(Vec<Filter<F>>),
}

impl<F: FilterField> Filter<F> {
    /// Combines this predicate with the active-only constraint.
    pub fn and_active(self) -> Self {
        match self {
            Self::And(mut clauses) => {
                clauses.push(Self::Active);
                Self::And(clauses)
            }
            other => Self::And(vec![other, Self::Active]),
        }
    }

    /// Compiles the predicate into a SQL fragment plus positional bind values.
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut binds = Vec::new();
        let sql = self.write_sql(&mut binds);
        (sql, binds)
    }

    fn write_sql(&self, binds: &mut Vec<Value>) -> String {
        match self {
            Self::IdIn(ids) => {
                if ids.is_empty() {
                    return "0".to_string();
                }
                let placeholders = vec!["?"; ids.len()].join(", ");
                binds.extend(ids.iter().map(|id| Value::Text(id.to_string())));
                format!("uuid IN ({placeholders})")
            }
            Self::IdNot(id) => {
                binds.push(Value::Text(id.to_string()));
                "uuid <> ?".to_string()
            }
            Self::Active => "is_deleted = 0".to_string(),
            Self::Equals(field, value) => {
                binds.push(Value::Text(value.clone()));
                format!("{} = ?", field.column())
            }
            Self::ContainsIgnoreCase(field, term) => {
                binds.push(Value::Text(term.to_lowercase()));
                format!("instr({UNICODE_LOWER_FN}({}), ?) > 0", field.column())
            }
            Self::OnOrAfter(field, bound) => {
                binds.push(Value::Integer(bound.timestamp_millis()));
                format!("{} >= ?", field.column())
            }
            Self::OnOrBefore(field, bound) => {
                binds.push(Value::Integer(bound.timestamp_millis()));
                format!("{} <= ?", field.column())
            }
            Self::And(clauses) => join_clauses(clauses, " AND ", "1", binds),
            Self::Or(clauses) => join_clauses(clauses, " OR ", "0", binds),
        }
    }
}

fn join_clauses<F: FilterField>(
    clauses: &[Filter<F>],
    separator: &str,
    empty: &str,
    binds: &mut Vec<Value>,
) -> String {
    if clauses.is_empty() {
        return empty.to_string();
    }
    let parts = clauses
        .iter()
        .map(|clause| format!("({})", clause.write_sql(binds)))
        .collect::<Vec<_>>();
    parts.join(separator)
}

/// Queryable student fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
    FullNameEn,
    FullNameKm,
    PhoneNumber,
    Gender,
}

impl FilterField for StudentField {
    fn column(self) -> &'static str {
        match self {
            Self::FullNameEn => "full_name_en",
            Self::FullNameKm => "full_name_km",
            Self::PhoneNumber => "phone_number",
            Self::Gender => "gender",
        }
    }
}

/// Queryable course fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseField {
    Name,
    ProfessorName,
    StartDate,
    EndDate,
}

impl FilterField for CourseField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ProfessorName => "professor_name",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
        }
    }
}
