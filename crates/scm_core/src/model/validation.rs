//! Input-shape validation shared by student and course documents.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub(crate) const NAME_MAX_CHARS: usize = 255;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+()\- ]{8,20}$").expect("valid phone regex"));

/// Document shape violation detected before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required text field is blank.
    #[error("`{0}` must not be empty")]
    EmptyField(&'static str),
    /// Text field exceeds its maximum length.
    #[error("`{field}` must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    /// Phone number does not match the accepted shape.
    #[error("invalid phone number `{0}`")]
    InvalidPhoneNumber(String),
    /// Course capacity must be a positive integer.
    #[error("`limit_number_of_students` must be positive")]
    NonPositiveLimit,
    /// Course ends before it starts.
    #[error("`end_date` must not be earlier than `start_date`")]
    EndBeforeStart,
    /// Relationship list repeats an id.
    #[error("duplicate ids in `{0}`")]
    DuplicateIds(&'static str),
    /// Date text is neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("invalid date `{0}`; expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > NAME_MAX_CHARS {
        return Err(ValidationError::TooLong {
            field,
            max: NAME_MAX_CHARS,
        });
    }
    Ok(())
}

/// Accepts 8..=20 characters drawn from digits, spaces, `+`, `-`, `(` and `)`.
///
/// The character set is narrower than a plain length check on purpose so that
/// stored numbers stay dialable and comparable for the uniqueness check.
pub(crate) fn require_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhoneNumber(value.to_string()))
    }
}

/// Parses a date supplied by a caller.
///
/// Accepts a full RFC 3339 timestamp or a plain calendar date, which is read
/// as midnight UTC.
pub fn parse_date_input(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_date_input, require_phone, require_text, ValidationError};
    use chrono::{TimeZone, Utc};

    #[test]
    fn plain_date_is_midnight_utc() {
        let parsed = parse_date_input("2023-09-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rfc3339_offset_is_normalized_to_utc() {
        let parsed = parse_date_input("2023-09-01T07:00:00+07:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_date_is_rejected() {
        let err = parse_date_input("first of september").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate(_)));
    }

    #[test]
    fn text_rules() {
        assert_eq!(
            require_text("name", "   "),
            Err(ValidationError::EmptyField("name"))
        );
        assert!(require_text("name", &"x".repeat(256)).is_err());
        assert!(require_text("name", "Math 101").is_ok());
    }

    #[test]
    fn phone_rules() {
        assert!(require_phone("+855 12 345 678").is_ok());
        assert!(require_phone("1234").is_err());
        assert!(require_phone("call-me-maybe").is_err());
    }
}
