//! The annotation store: favorites, notes, reviews and the dark mode flag.
//!
//! In-memory state is authoritative for the running session. Every mutation
//! writes the collection it touched back through [`Persistence`] before
//! returning; a failed write is logged by the adapter and the mutation stands.

use chrono::{DateTime, Duration, Utc};

use crate::core::{Note, Review, ReviewDraft};
use crate::storage::{KeyValueStore, Persistence, StorageKey};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationState {
    /// Insertion-ordered, no duplicates.
    pub favorites: Vec<String>,
    pub notes: Vec<Note>,
    pub reviews: Vec<Review>,
    pub dark_mode: bool,
}

impl Default for AnnotationState {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            notes: Vec::new(),
            reviews: Vec::new(),
            dark_mode: true,
        }
    }
}

pub struct AnnotationStore<S> {
    state: AnnotationState,
    persistence: Persistence<S>,
    clock: Box<dyn Clock>,
    last_stamp: Option<DateTime<Utc>>,
}

impl<S: KeyValueStore> AnnotationStore<S> {
    /// Hydrate from storage, defaulting anything missing or corrupt.
    pub fn open(persistence: Persistence<S>) -> Self {
        Self::open_with_clock(persistence, SystemClock)
    }

    pub fn open_with_clock(persistence: Persistence<S>, clock: impl Clock + 'static) -> Self {
        let state = hydrate(&persistence);
        let last_stamp = state
            .notes
            .iter()
            .map(|n| n.timestamp)
            .chain(state.reviews.iter().map(|r| r.timestamp))
            .max();

        log::info!(
            "Loaded {} favorites, {} notes, {} reviews (dark mode {})",
            state.favorites.len(),
            state.notes.len(),
            state.reviews.len(),
            if state.dark_mode { "on" } else { "off" }
        );

        Self {
            state,
            persistence,
            clock: Box::new(clock),
            last_stamp,
        }
    }

    pub fn favorites(&self) -> &[String] {
        &self.state.favorites
    }

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn reviews(&self) -> &[Review] {
        &self.state.reviews
    }

    pub fn dark_mode(&self) -> bool {
        self.state.dark_mode
    }

    /// Owned copy of the whole state; later mutations do not show up in it.
    pub fn snapshot(&self) -> AnnotationState {
        self.state.clone()
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn into_persistence(self) -> Persistence<S> {
        self.persistence
    }

    pub fn is_favorite(&self, film_id: &str) -> bool {
        self.state.favorites.iter().any(|id| id == film_id)
    }

    /// Returns `false` when the film was already a favorite.
    pub fn add_favorite(&mut self, film_id: &str) -> bool {
        if film_id.is_empty() || self.is_favorite(film_id) {
            return false;
        }
        self.state.favorites.push(film_id.to_string());
        self.persist(StorageKey::Favorites);
        true
    }

    /// Returns `false` when the film was not a favorite.
    pub fn remove_favorite(&mut self, film_id: &str) -> bool {
        let before = self.state.favorites.len();
        self.state.favorites.retain(|id| id != film_id);
        if self.state.favorites.len() == before {
            return false;
        }
        self.persist(StorageKey::Favorites);
        true
    }

    /// Flip membership and return whether the film is now a favorite.
    pub fn toggle_favorite(&mut self, film_id: &str) -> bool {
        if self.is_favorite(film_id) {
            self.remove_favorite(film_id);
            false
        } else {
            self.add_favorite(film_id)
        }
    }

    /// Append a note stamped with the current time.
    ///
    /// Blank bodies and empty film ids are ignored (`None`). Length rules are
    /// the caller's job, see [`crate::validate::validate_note`].
    pub fn add_note(&mut self, film_id: &str, body: &str) -> Option<DateTime<Utc>> {
        if film_id.is_empty() || body.trim().is_empty() {
            log::debug!("Ignoring blank note for film {:?}", film_id);
            return None;
        }
        let timestamp = self.next_stamp();
        self.state.notes.push(Note::new(film_id, body, timestamp));
        self.persist(StorageKey::Notes);
        Some(timestamp)
    }

    /// Notes for one film in insertion order.
    pub fn notes_for(&self, film_id: &str) -> Vec<&Note> {
        self.state.notes.iter().filter(|n| n.film_id == film_id).collect()
    }

    /// Returns `false` when nothing matched.
    pub fn delete_note(&mut self, film_id: &str, created_at: DateTime<Utc>) -> bool {
        let before = self.state.notes.len();
        self.state.notes.retain(|n| !n.is_keyed(film_id, created_at));
        if self.state.notes.len() == before {
            return false;
        }
        self.persist(StorageKey::Notes);
        true
    }

    /// Stamp and append a review. The draft is not validated here, see
    /// [`crate::submit::submit_review`]. Only an empty film id is refused.
    pub fn add_review(&mut self, draft: ReviewDraft) -> Option<DateTime<Utc>> {
        if draft.film_id.is_empty() {
            log::debug!("Ignoring review without a film id");
            return None;
        }
        let timestamp = self.next_stamp();
        self.state.reviews.push(draft.into_review(timestamp));
        self.persist(StorageKey::Reviews);
        Some(timestamp)
    }

    pub fn reviews_for(&self, film_id: &str) -> Vec<&Review> {
        self.state.reviews.iter().filter(|r| r.film_id == film_id).collect()
    }

    pub fn delete_review(&mut self, film_id: &str, created_at: DateTime<Utc>) -> bool {
        let before = self.state.reviews.len();
        self.state.reviews.retain(|r| !r.is_keyed(film_id, created_at));
        if self.state.reviews.len() == before {
            return false;
        }
        self.persist(StorageKey::Reviews);
        true
    }

    /// Flip dark mode and return the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.state.dark_mode = !self.state.dark_mode;
        self.persist(StorageKey::DarkMode);
        self.state.dark_mode
    }

    /// Current time, nudged forward so stamps strictly increase within the
    /// session and stay ahead of anything loaded from storage.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let mut stamp = self.clock.now();
        if let Some(last) = self.last_stamp {
            if stamp <= last {
                stamp = last + Duration::milliseconds(1);
            }
        }
        self.last_stamp = Some(stamp);
        stamp
    }

    // The result of `save` is deliberately dropped: a failed write has
    // already been logged and must not undo the in-memory change.
    fn persist(&mut self, key: StorageKey) {
        let state = &self.state;
        let _ = match key {
            StorageKey::Favorites => self.persistence.save(key, &state.favorites),
            StorageKey::Notes => self.persistence.save(key, &state.notes),
            StorageKey::Reviews => self.persistence.save(key, &state.reviews),
            StorageKey::DarkMode => self.persistence.save(key, &state.dark_mode),
        };
    }
}

fn hydrate<S: KeyValueStore>(persistence: &Persistence<S>) -> AnnotationState {
    let mut state = AnnotationState::default();

    if let Some(ids) = persistence.load_list::<String>(StorageKey::Favorites) {
        for id in ids {
            if id.is_empty() || state.favorites.contains(&id) {
                log::warn!("Dropping duplicate or empty favorite {:?}", id);
                continue;
            }
            state.favorites.push(id);
        }
    }

    if let Some(notes) = persistence.load_list::<Note>(StorageKey::Notes) {
        state.notes = notes
            .into_iter()
            .filter(|n| {
                let keep = !n.film_id.is_empty();
                if !keep {
                    log::warn!("Dropping note without a film id (stamped {})", n.timestamp);
                }
                keep
            })
            .collect();
    }

    if let Some(reviews) = persistence.load_list::<Review>(StorageKey::Reviews) {
        state.reviews = reviews
            .into_iter()
            .filter(|r| {
                let keep = !r.film_id.is_empty() && (1..=5).contains(&r.rating);
                if !keep {
                    log::warn!(
                        "Dropping review for film {:?} with rating {} (stamped {})",
                        r.film_id,
                        r.rating,
                        r.timestamp
                    );
                }
                keep
            })
            .collect();
    }

    if let Some(dark_mode) = persistence.load::<bool>(StorageKey::DarkMode) {
        state.dark_mode = dark_mode;
    }

    state
}
