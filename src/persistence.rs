//! JSON file persistence for settings and statistics.

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not determine a home directory")]
    NoHomeDir,
}

/// A load/save service for one persisted document.
pub trait Store<T>: Send {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<T>, PersistenceError>;

    /// Replaces the stored document as a whole.
    fn save(&self, value: &T) -> Result<(), PersistenceError>;
}

/// A JSON document on disk, overwritten atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize + DeserializeOwned> Store<T> for JsonFileStore {
    fn load(&self) -> Result<Option<T>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, value: &T) -> Result<(), PersistenceError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        // Write next to the target so the rename stays on one filesystem
        let mut temp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut temp, value)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// An in-memory store holding the serialized JSON text.
///
/// Clones share contents, so a test can keep a handle while the app owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with raw text, which need not be valid JSON.
    pub fn with_contents(raw: impl Into<String>) -> Self {
        let store = Self::new();
        *store.lock() = Some(raw.into());
        store
    }

    /// The raw text last written, if any.
    pub fn contents(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Makes subsequent saves fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Serialize + DeserializeOwned> Store<T> for MemoryStore {
    fn load(&self) -> Result<Option<T>, PersistenceError> {
        match self.lock().as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, value: &T) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other("write refused").into());
        }
        let raw = serde_json::to_string_pretty(value)?;
        *self.lock() = Some(raw);
        Ok(())
    }
}

/// Locations of the files the application reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub config_file: PathBuf,
    pub stats_file: PathBuf,
    pub log_dir: PathBuf,
}

impl Paths {
    /// Platform directories, or everything under `data_dir` when given.
    pub fn resolve(data_dir: Option<&Path>) -> Result<Self, PersistenceError> {
        if let Some(dir) = data_dir {
            return Ok(Self::in_dir(dir));
        }

        let dirs =
            ProjectDirs::from("com", "pomotimer", "Pomotimer").ok_or(PersistenceError::NoHomeDir)?;
        Ok(Self {
            config_file: dirs.config_dir().join("config.json"),
            stats_file: dirs.data_dir().join("statistics.json"),
            log_dir: dirs.data_dir().join("logs"),
        })
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_file: dir.join("config.json"),
            stats_file: dir.join("statistics.json"),
            log_dir: dir.join("logs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Statistics;
    use crate::settings::Settings;

    #[test]
    fn test_file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));
        let loaded: Option<Settings> = store.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_file_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("config.json"));

        let custom = Settings {
            work_time_minutes: 30,
            break_time_minutes: 10,
            ..Settings::default()
        };
        store.save(&custom).unwrap();

        let loaded: Settings = store.load().unwrap().unwrap();
        assert_eq!(loaded, custom);
    }

    #[test]
    fn test_file_store_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));

        let first = Settings {
            work_time_minutes: 30,
            ..Settings::default()
        };
        store.save(&first).unwrap();
        let second = Settings {
            work_time_minutes: 45,
            ..Settings::default()
        };
        store.save(&second).unwrap();

        let loaded: Settings = store.load().unwrap().unwrap();
        assert_eq!(loaded.work_time_minutes, 45);

        // Only the target file remains, no temp files
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_file_store_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.json");
        fs::write(&path, "invalid json {{{").unwrap();

        let store = JsonFileStore::new(path);
        let result: Result<Option<Statistics>, _> = store.load();
        assert!(matches!(result, Err(PersistenceError::Json(_))));
    }

    #[test]
    fn test_memory_store_shares_contents() {
        let store = MemoryStore::new();
        let handle = store.clone();
        Store::<Settings>::save(&store, &Settings::default()).unwrap();
        assert!(handle.contents().unwrap().contains("work_time_minutes"));
    }

    #[test]
    fn test_memory_store_fail_writes() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let result = Store::<Settings>::save(&store, &Settings::default());
        assert!(matches!(result, Err(PersistenceError::Io(_))));
        assert!(store.contents().is_none());
    }

    #[test]
    fn test_paths_in_dir() {
        let paths = Paths::resolve(Some(Path::new("/tmp/pomo"))).unwrap();
        assert_eq!(paths.config_file, PathBuf::from("/tmp/pomo/config.json"));
        assert_eq!(paths.stats_file, PathBuf::from("/tmp/pomo/statistics.json"));
        assert_eq!(paths.log_dir, PathBuf::from("/tmp/pomo/logs"));
    }
}
