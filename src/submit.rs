//! Validate-then-store entry points for anything accepting user input.

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::ReviewDraft;
use crate::storage::KeyValueStore;
use crate::store::AnnotationStore;
use crate::validate::{Violations, validate_film_id, validate_note, validate_review};

/// Add a note if `body` passes [`validate_note`].
pub fn submit_note<S: KeyValueStore>(
    store: &mut AnnotationStore<S>,
    film_id: &str,
    body: &str,
    min_len: usize,
) -> Result<DateTime<Utc>, Violations> {
    let mut violations = validate_film_id(film_id);
    violations.extend(validate_note(body, min_len));
    if !violations.is_empty() {
        log::debug!("Rejected note for {:?}: {}", film_id, violations);
        return Err(violations);
    }
    store.add_note(film_id, body).ok_or(violations)
}

/// Add a review if it passes [`validate_review`] against `today`.
pub fn submit_review<S: KeyValueStore>(
    store: &mut AnnotationStore<S>,
    draft: ReviewDraft,
    today: NaiveDate,
) -> Result<DateTime<Utc>, Violations> {
    let mut violations = validate_film_id(&draft.film_id);
    violations.extend(validate_review(&draft, today));
    if !violations.is_empty() {
        log::debug!("Rejected review for {:?}: {}", draft.film_id, violations);
        return Err(violations);
    }
    store.add_review(draft).ok_or(violations)
}
