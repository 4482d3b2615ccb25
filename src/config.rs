use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_VERSION: u64 = 1;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "FILMNOTES_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to write config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("filmnotes")
}

fn default_key_prefix() -> String {
    crate::storage::DEFAULT_KEY_PREFIX.into()
}

fn default_note_min_length() -> usize {
    crate::validate::NOTE_MIN
}

fn default_preview_length() -> usize {
    crate::core::text::DEFAULT_PREVIEW_LENGTH
}

fn default_version() -> u64 {
    CONFIG_VERSION
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilmNotesConfig {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default = "default_storage_dir")]
    pub storage_directory: PathBuf,
    /// Namespace prepended to every persisted entry name.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_note_min_length")]
    pub note_min_length: usize,
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for FilmNotesConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage_directory: default_storage_dir(),
            key_prefix: default_key_prefix(),
            note_min_length: default_note_min_length(),
            preview_length: default_preview_length(),
            debug_logging: false,
        }
    }
}

impl FilmNotesConfig {
    /// Location of the config file: `$FILMNOTES_CONFIG`, else `<config dir>/filmnotes/config.json`.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("filmnotes")
            .join("config.json")
    }

    /// Read the config file, falling back to defaults when it is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(config) => {
                if config.version != CONFIG_VERSION {
                    log::warn!(
                        "Config {} has version {}, expected {}",
                        path.display(),
                        config.version,
                        CONFIG_VERSION
                    );
                }
                config
            }
            Err(e) => {
                log::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
