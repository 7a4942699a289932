//! Identifier helpers shared by storage and enrollment services.
//!
//! # Responsibility
//! - Define the canonical string form used to compare identifiers.
//! - Detect duplicates and overlaps across raw ids and their string encodings.
//!
//! # Invariants
//! - Canonical form is the lowercase hyphenated UUID text.
//! - `are_disjoint` fails closed: absent or malformed input is never "disjoint".

use std::collections::HashSet;
use std::fmt::Display;
use uuid::Uuid;

/// Stable identifier of a student document.
pub type StudentId = Uuid;

/// Stable identifier of a course document.
pub type CourseId = Uuid;

/// Value that can be reduced to a canonical identifier string.
///
/// Implemented for raw [`Uuid`] values and for their textual encodings, so the
/// same id compares equal regardless of how a caller holds it.
pub trait CanonicalId: Display {
    /// Returns the canonical string form, or `None` for malformed text.
    fn canonical_id(&self) -> Option<String>;
}

impl CanonicalId for Uuid {
    fn canonical_id(&self) -> Option<String> {
        Some(self.hyphenated().to_string())
    }
}

impl CanonicalId for str {
    fn canonical_id(&self) -> Option<String> {
        parse_id(self).map(|id| id.hyphenated().to_string())
    }
}

impl CanonicalId for String {
    fn canonical_id(&self) -> Option<String> {
        self.as_str().canonical_id()
    }
}

impl<T: CanonicalId + ?Sized> CanonicalId for &T {
    fn canonical_id(&self) -> Option<String> {
        (**self).canonical_id()
    }
}

/// Parses one identifier from text, tolerating surrounding whitespace.
pub fn parse_id(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value.trim()).ok()
}

/// Returns `true` when any identifier appears more than once.
///
/// Values are compared by canonical form; malformed text falls back to its
/// raw trimmed text so two identical malformed entries still count as repeats.
pub fn has_duplicates<T: CanonicalId>(ids: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        let key = id
            .canonical_id()
            .unwrap_or_else(|| id.to_string().trim().to_string());
        if !seen.insert(key) {
            return true;
        }
    }
    false
}

/// Returns `true` when no identifier of `left` also appears in `right`.
///
/// `None` on either side stands for input that is not a sequence at all and
/// yields `false`, as does any malformed element.
pub fn are_disjoint<A: CanonicalId, B: CanonicalId>(
    left: Option<&[A]>,
    right: Option<&[B]>,
) -> bool {
    let (Some(left), Some(right)) = (left, right) else {
        return false;
    };

    let mut right_keys = HashSet::with_capacity(right.len());
    for id in right {
        match id.canonical_id() {
            Some(key) => {
                right_keys.insert(key);
            }
            None => return false,
        }
    }

    for id in left {
        match id.canonical_id() {
            Some(key) if right_keys.contains(&key) => return false,
            Some(_) => {}
            None => return false,
        }
    }

    true
}
