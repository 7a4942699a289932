//! Search filter builders for students and courses.
//!
//! # Responsibility
//! - Turn a free-text term into a disjunctive substring filter over the
//!   configured text fields of one collection.
//! - Turn an optional date range into the course bound filter.
//!
//! # Invariants
//! - Text matching is case-insensitive substring matching.
//! - Date bounds are combined with OR: supplying both bounds yields the union
//!   of courses starting on/after the lower bound and courses ending on/before
//!   the upper bound.

use crate::model::validation::{parse_date_input, ValidationError};
use crate::repo::filter::{CourseField, Filter, StudentField};
use chrono::{DateTime, Utc};

/// Student fields a search term is matched against.
pub const STUDENT_SEARCH_FIELDS: [StudentField; 3] = [
    StudentField::FullNameEn,
    StudentField::FullNameKm,
    StudentField::PhoneNumber,
];

/// Course fields a search term is matched against.
pub const COURSE_SEARCH_FIELDS: [CourseField; 1] = [CourseField::Name];

/// Optional bounds for the advanced course search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseDateRange {
    /// Matches courses with `start_date >= start_date`.
    pub start_date: Option<DateTime<Utc>>,
    /// Matches courses with `end_date <= end_date`.
    pub end_date: Option<DateTime<Utc>>,
}

impl CourseDateRange {
    /// Parses bounds given as text; blank text counts as not supplied.
    pub fn parse(start_date: Option<&str>, end_date: Option<&str>) -> Result<Self, ValidationError> {
        Ok(Self {
            start_date: parse_optional(start_date)?,
            end_date: parse_optional(end_date)?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }
}

fn parse_optional(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => parse_date_input(text).map(Some),
        _ => Ok(None),
    }
}

/// Builds the student text-search filter.
pub fn student_search_filter(term: &str) -> Filter<StudentField> {
    text_filter(&STUDENT_SEARCH_FIELDS, term)
}

/// Builds the course text-search filter.
pub fn course_search_filter(term: &str) -> Filter<CourseField> {
    text_filter(&COURSE_SEARCH_FIELDS, term)
}

/// Builds the advanced course filter: one clause per supplied bound, OR-ed.
pub fn course_date_range_filter(range: &CourseDateRange) -> Filter<CourseField> {
    let mut clauses = Vec::with_capacity(2);
    if let Some(start_date) = range.start_date {
        clauses.push(Filter::OnOrAfter(CourseField::StartDate, start_date));
    }
    if let Some(end_date) = range.end_date {
        clauses.push(Filter::OnOrBefore(CourseField::EndDate, end_date));
    }
    Filter::Or(clauses)
}

fn text_filter<F: Copy>(fields: &[F], term: &str) -> Filter<F> {
    let term = term.trim();
    Filter::Or(
        fields
            .iter()
            .map(|field| Filter::ContainsIgnoreCase(*field, term.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{course_date_range_filter, student_search_filter, CourseDateRange};
    use crate::repo::filter::{CourseField, Filter, StudentField};

    #[test]
    fn student_term_covers_both_names_and_phone() {
        let filter = student_search_filter("  sok ");
        assert_eq!(
            filter,
            Filter::Or(vec![
                Filter::ContainsIgnoreCase(StudentField::FullNameEn, "sok".to_string()),
                Filter::ContainsIgnoreCase(StudentField::FullNameKm, "sok".to_string()),
                Filter::ContainsIgnoreCase(StudentField::PhoneNumber, "sok".to_string()),
            ])
        );
    }

    #[test]
    fn date_range_includes_only_supplied_bounds() {
        let range = CourseDateRange::parse(Some("2023-09-01"), None).unwrap();
        let filter = course_date_range_filter(&range);
        let Filter::Or(clauses) = filter else {
            panic!("expected disjunction");
        };
        assert_eq!(clauses.len(), 1);
        assert!(matches!(clauses[0], Filter::OnOrAfter(CourseField::StartDate, _)));
    }

    #[test]
    fn both_bounds_are_or_combined() {
        let range = CourseDateRange::parse(Some("2023-09-01"), Some("2023-12-15")).unwrap();
        let Filter::Or(clauses) = course_date_range_filter(&range) else {
            panic!("expected disjunction");
        };
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn blank_bounds_are_unbounded() {
        let range = CourseDateRange::parse(Some("  "), None).unwrap();
        assert!(range.is_unbounded());
        assert!(CourseDateRange::parse(Some("soon"), None).is_err());
    }
}
