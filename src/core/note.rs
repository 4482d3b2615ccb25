use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-text note attached to a film.
///
/// `(film_id, timestamp)` identifies the note for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub film_id: String,
    #[serde(default)]
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl Note {
    pub fn new(film_id: impl Into<String>, note: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            film_id: film_id.into(),
            note: note.into(),
            timestamp,
        }
    }

    pub fn is_keyed(&self, film_id: &str, timestamp: DateTime<Utc>) -> bool {
        self.film_id == film_id && self.timestamp == timestamp
    }
}
