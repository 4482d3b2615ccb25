//! Durable key/value storage and the JSON layer on top of it.
//!
//! Storage is best-effort. Nothing in this module returns an error to the
//! store: failed reads and corrupt entries come back as `None`, failed writes
//! come back as `false`, and every failure is logged.

pub mod file;
pub mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const DEFAULT_KEY_PREFIX: &str = "ghibli_";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("i/o error on {key}: {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },
}

/// Flat string entries surviving restarts.
pub trait KeyValueStore {
    /// `Ok(None)` when the entry was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// The four persisted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Favorites,
    Notes,
    Reviews,
    DarkMode,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [Self::Favorites, Self::Notes, Self::Reviews, Self::DarkMode];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Notes => "notes",
            Self::Reviews => "reviews",
            Self::DarkMode => "dark_mode",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON adapter over a [`KeyValueStore`], namespacing every entry with a prefix.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    prefix: String,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn entry_name(&self, key: StorageKey) -> String {
        format!("{}{}", self.prefix, key.as_str())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn read(&self, key: StorageKey) -> Option<String> {
        let name = self.entry_name(key);
        match self.store.get(&name) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to read {}: {}", name, e);
                None
            }
        }
    }

    /// Decode an entry. Missing, unreadable and unparseable entries are all `None`.
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let raw = self.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring corrupt {} entry: {}", self.entry_name(key), e);
                None
            }
        }
    }

    /// Decode a sequence entry record by record.
    ///
    /// Records that fail to decode are dropped; the rest are kept in order.
    /// An entry that is not a JSON array at all is `None`.
    pub fn load_list<T: DeserializeOwned>(&self, key: StorageKey) -> Option<Vec<T>> {
        let items: Vec<serde_json::Value> = self.load(key)?;
        let total = items.len();
        let decoded: Vec<T> = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Dropping record {} of {}: {}", i, self.entry_name(key), e);
                    None
                }
            })
            .collect();
        if decoded.len() < total {
            log::warn!(
                "Loaded {} of {} records from {}",
                decoded.len(),
                total,
                self.entry_name(key)
            );
        }
        Some(decoded)
    }

    /// Encode and write an entry. Failures are logged and reported as `false`.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: StorageKey, value: &T) -> bool {
        let name = self.entry_name(key);
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize {}: {}", name, e);
                return false;
            }
        };
        match self.store.set(&name, &json) {
            Ok(()) => {
                log::debug!("Saved {} ({} bytes)", name, json.len());
                true
            }
            Err(e) => {
                log::error!("Failed to save {}: {}", name, e);
                false
            }
        }
    }

    pub fn clear(&mut self, key: StorageKey) -> bool {
        let name = self.entry_name(key);
        match self.store.remove(&name) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to remove {}: {}", name, e);
                false
            }
        }
    }
}
