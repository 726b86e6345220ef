//! Merge-on-write JSON stores.
//!
//! A store is a single JSON object on disk. Writing an entry reads the
//! object back, inserts the entry under its key and rewrites the whole file:
//!
//! - a missing file starts an empty store;
//! - an unreadable or non-object file is logged and replaced;
//! - an existing key is overwritten, every other key is kept.
//!
//! The rewrite is not atomic and there is no locking. Two processes writing
//! the same store race and the last writer wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PersistError;
use crate::output::json::write_pretty;
use crate::solver::RunResult;

/// Read the object stored at `path`.
///
/// Missing files give an empty object. Unparseable content also gives an
/// empty object, with a warning, so the next write replaces it.
pub fn load_object(path: &Path) -> Result<Map<String, Value>, PersistError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(PersistError::io(path, e)),
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::warn!("{} does not hold a JSON object; starting a new store", path.display());
            Ok(Map::new())
        }
        Err(e) => {
            tracing::warn!("{} is not valid JSON ({}); starting a new store", path.display(), e);
            Ok(Map::new())
        }
    }
}

/// Insert `value` under `key` in the store at `path` and rewrite the file.
pub fn merge_entry<T: Serialize + ?Sized>(
    path: &Path,
    key: &str,
    value: &T,
) -> Result<(), PersistError> {
    let mut store = load_object(path)?;
    let value = serde_json::to_value(value).map_err(|e| PersistError::json(path, e))?;
    store.insert(key.to_string(), value);
    write_pretty(path, &store)
}

/// Merge `run` into the store at `path`, keyed by its timestamp.
pub fn persist_run(path: &Path, run: &RunResult) -> Result<(), PersistError> {
    merge_entry(path, &run.timestamp, run)?;
    tracing::info!("Saved run {} to {}", run.timestamp, path.display());
    Ok(())
}

/// Store of exclusion runs keyed by ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionStore {
    path: PathBuf,
}

impl ExclusionStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/exclusion_limits.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(crate::config::EXCLUSION_STORE_FILE))
    }

    /// File backing the store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge one run into the store.
    pub fn persist(&self, run: &RunResult) -> Result<(), PersistError> {
        persist_run(&self.path, run)
    }

    /// All stored runs as raw JSON, keyed by timestamp.
    pub fn load(&self) -> Result<Map<String, Value>, PersistError> {
        load_object(&self.path)
    }

    /// Stored run under `timestamp`, if it parses as a [`RunResult`].
    pub fn get(&self, timestamp: &str) -> Result<Option<RunResult>, PersistError> {
        let mut store = self.load()?;
        match store.remove(timestamp) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| PersistError::json(&self.path, e)),
            None => Ok(None),
        }
    }
}
