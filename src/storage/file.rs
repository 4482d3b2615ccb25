use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError};

/// One `<key>.json` file per entry inside a directory.
///
/// The directory is created on the first write. Writes go to a temp file
/// that is then renamed over the entry.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }

    fn io_error(key: &str, source: std::io::Error) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.entry_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.directory).map_err(|e| Self::io_error(key, e))?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| Self::io_error(key, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| Self::io_error(key, e))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn never_written_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("ghibli_notes").unwrap(), None);
    }

    #[test]
    fn creates_directory_on_write() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("a").join("b"));
        store.set("ghibli_dark_mode", "true").unwrap();
        assert!(dir.path().join("a/b/ghibli_dark_mode.json").exists());
        assert_eq!(store.get("ghibli_dark_mode").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.set("k", "[1]").unwrap();
        store.set("k", "[1,2]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[1,2]"));
        assert!(!dir.path().join("k.json.tmp").exists());
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.remove("never").unwrap();
        store.set("k", "1").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn unwritable_directory_errors() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        let mut store = FileStore::new(&blocker);
        assert!(store.set("k", "1").is_err());
    }
}
