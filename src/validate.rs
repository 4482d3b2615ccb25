//! Field rules for review and note submissions.
//!
//! Every rule runs on every call; a caller gets all violations at once and
//! can show each one next to the input it belongs to.

use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::core::ReviewDraft;

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;
pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 50;
pub const BODY_MIN: usize = 50;
pub const BODY_MAX: usize = 500;
pub const NOTE_MIN: usize = 10;

static SPOILER_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)spoiler").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Film,
    Rating,
    Title,
    Body,
    Mood,
    DateWatched,
    Note,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Film => "filmId",
            Self::Rating => "rating",
            Self::Title => "title",
            Self::Body => "reviewText",
            Self::Mood => "mood",
            Self::DateWatched => "dateWatched",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    OutOfRange { min: u8, max: u8, actual: u8 },
    MissingSpoilerMarker,
    InFuture { today: NaiveDate },
}

impl ViolationKind {
    /// Stable short name, usable as an error key by a form.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooShort { .. } => "minlength",
            Self::TooLong { .. } => "maxlength",
            Self::OutOfRange { .. } => "range",
            Self::MissingSpoilerMarker => "spoilerWarning",
            Self::InFuture { .. } => "future",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: Field,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Required => write!(f, "{} is required", self.field),
            ViolationKind::TooShort { min, actual } => {
                write!(f, "{} must be at least {} characters (has {})", self.field, min, actual)
            }
            ViolationKind::TooLong { max, actual } => {
                write!(f, "{} must be at most {} characters (has {})", self.field, max, actual)
            }
            ViolationKind::OutOfRange { min, max, actual } => {
                write!(f, "{} must be between {} and {} (got {})", self.field, min, max, actual)
            }
            ViolationKind::MissingSpoilerMarker => write!(
                f,
                "{} must mention \"spoiler\" when the review is marked as containing spoilers",
                self.field
            ),
            ViolationKind::InFuture { today } => {
                write!(f, "{} cannot be after {}", self.field, today)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    pub fn for_field(&self, field: Field) -> impl Iterator<Item = &ViolationKind> {
        self.0.iter().filter(move |v| v.field == field).map(|v| &v.kind)
    }

    pub fn has(&self, field: Field, code: &str) -> bool {
        self.for_field(field).any(|k| k.code() == code)
    }

    fn push(&mut self, field: Field, kind: ViolationKind) {
        self.0.push(Violation { field, kind });
    }

    /// Empty text is `Required`; otherwise the length must be within bounds.
    fn check_text(&mut self, field: Field, value: &str, min: usize, max: Option<usize>) {
        if value.is_empty() {
            self.push(field, ViolationKind::Required);
            return;
        }
        let actual = value.chars().count();
        if actual < min {
            self.push(field, ViolationKind::TooShort { min, actual });
        }
        if let Some(max) = max {
            if actual > max {
                self.push(field, ViolationKind::TooLong { max, actual });
            }
        }
    }
}

impl Extend<Violation> for Violations {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

/// Does `body` carry the spoiler warning? Case-insensitive.
pub fn has_spoiler_marker(body: &str) -> bool {
    SPOILER_MARKER_RE.is_match(body)
}

/// Check a review candidate. `today` bounds `date_watched`.
///
/// The spoiler rule couples two fields: with `is_spoiler` set, the body must
/// contain the marker, and a miss is reported against [`Field::Body`]. Re-run
/// whenever either of them changes.
pub fn validate_review(draft: &ReviewDraft, today: NaiveDate) -> Violations {
    let mut violations = Violations::default();

    if !(RATING_MIN..=RATING_MAX).contains(&draft.rating) {
        violations.push(
            Field::Rating,
            ViolationKind::OutOfRange {
                min: RATING_MIN,
                max: RATING_MAX,
                actual: draft.rating,
            },
        );
    }

    violations.check_text(Field::Title, &draft.title, TITLE_MIN, Some(TITLE_MAX));
    violations.check_text(Field::Body, &draft.body, BODY_MIN, Some(BODY_MAX));

    if draft.mood.trim().is_empty() {
        violations.push(Field::Mood, ViolationKind::Required);
    }

    if let Some(watched) = draft.date_watched {
        if watched > today {
            violations.push(Field::DateWatched, ViolationKind::InFuture { today });
        }
    }

    if draft.is_spoiler && !has_spoiler_marker(&draft.body) {
        violations.push(Field::Body, ViolationKind::MissingSpoilerMarker);
    }

    violations
}

/// Every annotation must name the film it belongs to.
pub fn validate_film_id(film_id: &str) -> Violations {
    let mut violations = Violations::default();
    if film_id.trim().is_empty() {
        violations.push(Field::Film, ViolationKind::Required);
    }
    violations
}

/// Check a note body: present and at least `min_len` characters.
pub fn validate_note(body: &str, min_len: usize) -> Violations {
    let mut violations = Violations::default();
    violations.check_text(Field::Note, body.trim(), min_len, None);
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn valid() -> ReviewDraft {
        ReviewDraft {
            film_id: "f1".into(),
            rating: 4,
            title: "Great film".into(),
            body: "The forest spirit sequence is one of the most memorable things I have seen.".into(),
            is_spoiler: false,
            mood: "happy".into(),
            date_watched: NaiveDate::from_ymd_opt(2024, 5, 31),
        }
    }

    #[test]
    fn valid_review_passes() {
        assert!(validate_review(&valid(), today()).is_empty());
    }

    #[test]
    fn spoiler_without_marker_flags_body() {
        let draft = ReviewDraft {
            is_spoiler: true,
            body: "no warning here".into(),
            rating: 5,
            title: "Great film".into(),
            mood: "happy".into(),
            ..ReviewDraft::new("f1")
        };
        let violations = validate_review(&draft, today());
        assert!(violations.has(Field::Body, "spoilerWarning"));
        assert!(violations.has(Field::Body, "minlength"));
        assert_eq!(
            violations
                .iter()
                .filter(|v| v.kind == ViolationKind::MissingSpoilerMarker)
                .map(|v| v.field)
                .collect::<Vec<_>>(),
            [Field::Body]
        );
    }

    #[test]
    fn spoiler_marker_is_case_insensitive() {
        let draft = ReviewDraft {
            is_spoiler: true,
            body: "Contains a SPOILER ahead".into(),
            rating: 5,
            title: "Great film".into(),
            mood: "happy".into(),
            ..ReviewDraft::new("f1")
        };
        let violations = validate_review(&draft, today());
        assert!(!violations.has(Field::Body, "spoilerWarning"));
        // Still too short, which is a separate rule.
        assert!(violations.has(Field::Body, "minlength"));
    }

    #[test]
    fn no_spoiler_flag_never_requires_marker() {
        let long = "x".repeat(600);
        for body in ["short", "", "spoiler", long.as_str()] {
            let draft = ReviewDraft {
                body: body.to_string(),
                ..valid()
            };
            let violations = validate_review(&draft, today());
            assert!(!violations.has(Field::Body, "spoilerWarning"), "body {:?}", body);
        }

        let short = ReviewDraft {
            body: "short".into(),
            ..valid()
        };
        let violations = validate_review(&short, today());
        assert!(matches!(
            violations.for_field(Field::Body).collect::<Vec<_>>()[..],
            [ViolationKind::TooShort { min: 50, actual: 5 }]
        ));
    }

    #[test]
    fn toggling_spoiler_changes_outcome() {
        let mut draft = valid();
        assert!(validate_review(&draft, today()).is_empty());
        draft.is_spoiler = true;
        assert!(validate_review(&draft, today()).has(Field::Body, "spoilerWarning"));
        draft.body.push_str(" Spoiler: the spirit survives.");
        assert!(validate_review(&draft, today()).is_empty());
    }

    #[test]
    fn all_violations_reported_together() {
        let draft = ReviewDraft {
            is_spoiler: true,
            date_watched: NaiveDate::from_ymd_opt(2024, 6, 2),
            ..ReviewDraft::new("f1")
        };
        let violations = validate_review(&draft, today());
        assert!(violations.has(Field::Rating, "range"));
        assert!(violations.has(Field::Title, "required"));
        assert!(violations.has(Field::Body, "required"));
        assert!(violations.has(Field::Body, "spoilerWarning"));
        assert!(violations.has(Field::Mood, "required"));
        assert!(violations.has(Field::DateWatched, "future"));
        assert_eq!(violations.len(), 6);
    }

    #[test]
    fn empty_text_is_required_not_short() {
        let draft = ReviewDraft {
            title: String::new(),
            ..valid()
        };
        let kinds: Vec<_> = validate_review(&draft, today()).for_field(Field::Title).cloned().collect();
        assert_eq!(kinds, [ViolationKind::Required]);
    }

    #[test]
    fn length_bounds_are_inclusive() {
        let at_bounds = ReviewDraft {
            title: "a".repeat(TITLE_MIN),
            body: "b".repeat(BODY_MAX),
            ..valid()
        };
        assert!(validate_review(&at_bounds, today()).is_empty());

        let over = ReviewDraft {
            title: "a".repeat(TITLE_MAX + 1),
            body: "b".repeat(BODY_MIN - 1),
            ..valid()
        };
        let violations = validate_review(&over, today());
        assert!(violations.has(Field::Title, "maxlength"));
        assert!(violations.has(Field::Body, "minlength"));
    }

    #[test]
    fn rating_range() {
        for rating in [0, 6, 255] {
            let draft = ReviewDraft { rating, ..valid() };
            assert!(validate_review(&draft, today()).has(Field::Rating, "range"));
        }
        for rating in 1..=5 {
            let draft = ReviewDraft { rating, ..valid() };
            assert!(validate_review(&draft, today()).is_empty());
        }
    }

    #[test]
    fn whitespace_mood_is_missing() {
        let draft = ReviewDraft {
            mood: "  ".into(),
            ..valid()
        };
        assert!(validate_review(&draft, today()).has(Field::Mood, "required"));
    }

    #[test]
    fn watched_today_is_fine() {
        let draft = ReviewDraft {
            date_watched: Some(today()),
            ..valid()
        };
        assert!(validate_review(&draft, today()).is_empty());
    }

    #[test]
    fn note_rules() {
        assert!(validate_note("   ", NOTE_MIN).has(Field::Note, "required"));
        assert!(validate_note("too short", NOTE_MIN).has(Field::Note, "minlength"));
        assert!(validate_note("  long enough now  ", NOTE_MIN).is_empty());
    }

    #[test]
    fn messages_name_the_field() {
        let violations = validate_note("", NOTE_MIN);
        assert_eq!(violations.to_string(), "note is required");
    }
}
