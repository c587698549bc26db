//! Autosave and palette persistence
//!
//! Two independent records live in a small key-value store:
//!
//! - [`PALETTE_KEY`]: JSON array of the custom palette colors
//! - [`AUTOSAVE_KEY`]: the latest project snapshot, marked `autoSave: true`
//!   with an epoch-millisecond timestamp
//!
//! A restore is only offered for a snapshot older than the restore threshold,
//! so a snapshot written moments ago by the running session is not offered
//! back to it.

use crate::clock;
use crate::color::{parse_color_lenient, Color};
use crate::document::Document;
use crate::project::{ImportError, ProjectFile, Timestamp};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const PALETTE_KEY: &str = "pixelart_custom_colors";
pub const AUTOSAVE_KEY: &str = "pixel_art_autosave";

/// Default age after which an autosave is offered for restore.
pub const DEFAULT_RESTORE_AFTER: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored project is invalid: {0}")]
    Import(#[from] ImportError),
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// String key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Persist the custom palette.
pub fn save_palette(store: &mut dyn KeyValueStore, colors: &[Color]) -> Result<(), StorageError> {
    let hex: Vec<String> = colors.iter().map(Color::to_hex).collect();
    store.set(PALETTE_KEY, &serde_json::to_string(&hex)?)
}

/// Load the custom palette. Unparseable entries are skipped; a missing
/// record is an empty palette.
pub fn load_palette(store: &dyn KeyValueStore) -> Result<Vec<Color>, StorageError> {
    let Some(text) = store.get(PALETTE_KEY)? else {
        return Ok(Vec::new());
    };
    let hex: Vec<String> = serde_json::from_str(&text)?;
    Ok(hex.iter().filter_map(|c| parse_color_lenient(c)).collect())
}

/// Write an autosave snapshot stamped with `now_millis`.
pub fn autosave_at(store: &mut dyn KeyValueStore, doc: &Document, now_millis: u64) -> Result<(), StorageError> {
    let mut file = ProjectFile::from_document(doc);
    file.timestamp = Some(Timestamp::Millis(now_millis));
    file.auto_save = Some(true);
    store.set(AUTOSAVE_KEY, &serde_json::to_string(&file)?)?;
    log::debug!("autosaved {} layers", doc.layers().len());
    Ok(())
}

/// Write an autosave snapshot stamped with the current time.
pub fn autosave(store: &mut dyn KeyValueStore, doc: &Document) -> Result<(), StorageError> {
    autosave_at(store, doc, clock::now_millis())
}

/// The stored autosave, if there is one and it is older than `threshold`
/// at `now_millis`. A zero threshold accepts a record of any age.
pub fn pending_restore_at(
    store: &dyn KeyValueStore,
    now_millis: u64,
    threshold: Duration,
) -> Result<Option<ProjectFile>, StorageError> {
    let Some(text) = store.get(AUTOSAVE_KEY)? else {
        return Ok(None);
    };
    let file: ProjectFile = serde_json::from_str(&text)?;
    let Some(saved_at) = file.saved_at_millis().filter(|_| file.is_autosave()) else {
        return Ok(None);
    };
    let age = now_millis.saturating_sub(saved_at);
    if threshold.is_zero() || u128::from(age) > threshold.as_millis() {
        Ok(Some(file))
    } else {
        Ok(None)
    }
}

pub fn pending_restore(store: &dyn KeyValueStore, threshold: Duration) -> Result<Option<ProjectFile>, StorageError> {
    pending_restore_at(store, clock::now_millis(), threshold)
}

/// Load `file` into `doc` and delete the autosave record.
pub fn restore(store: &mut dyn KeyValueStore, doc: &mut Document, file: ProjectFile) -> Result<(), StorageError> {
    let project = file.into_project()?;
    doc.apply_project(project);
    store.remove(AUTOSAVE_KEY)?;
    log::info!("restored autosave");
    Ok(())
}
