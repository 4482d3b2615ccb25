use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A structured review of a film.
///
/// Only `filmId`, `rating` and `timestamp` are required when reading stored
/// data; older entries missing the other fields load with empty values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub film_id: String,
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "reviewText")]
    pub body: String,
    #[serde(default)]
    pub is_spoiler: bool,
    #[serde(default)]
    pub mood: String,
    #[serde(default, with = "watched_date", skip_serializing_if = "Option::is_none")]
    pub date_watched: Option<NaiveDate>,
    pub timestamp: DateTime<Utc>,
}

impl Review {
    pub fn is_keyed(&self, film_id: &str, timestamp: DateTime<Utc>) -> bool {
        self.film_id == film_id && self.timestamp == timestamp
    }

    /// Star string for display, e.g. `★★★☆☆`.
    pub fn stars(&self) -> String {
        let filled = usize::from(self.rating.min(5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

/// A review that has not been stamped yet: the candidate handed to the
/// validator and then to the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewDraft {
    pub film_id: String,
    /// 0 means no rating has been chosen.
    pub rating: u8,
    pub title: String,
    pub body: String,
    pub is_spoiler: bool,
    pub mood: String,
    pub date_watched: Option<NaiveDate>,
}

impl ReviewDraft {
    pub fn new(film_id: impl Into<String>) -> Self {
        Self {
            film_id: film_id.into(),
            ..Self::default()
        }
    }

    pub fn into_review(self, timestamp: DateTime<Utc>) -> Review {
        Review {
            film_id: self.film_id,
            rating: self.rating,
            title: self.title,
            body: self.body,
            is_spoiler: self.is_spoiler,
            mood: self.mood,
            date_watched: self.date_watched,
            timestamp,
        }
    }
}

/// `dateWatched` is written as `YYYY-MM-DD`. Reading also accepts a full
/// RFC 3339 datetime; anything else loads as no date.
mod watched_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| parse(&s)))
    }

    fn parse(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, FORMAT) {
            return Some(d);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }
        log::warn!("Dropping unreadable dateWatched value: {}", s);
        None
    }
}
