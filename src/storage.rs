use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::migrate;
use crate::models::PersistedState;

const STATE_FILE: &str = "state.json";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Loads the persisted state blob, or `None` when there is nothing usable:
    /// a missing file, malformed JSON, or a blob failing structural validation
    /// all fall back softly. The caller substitutes the default state; none of
    /// these cases is surfaced to the user.
    pub fn load_state(&self) -> Option<PersistedState> {
        let path = self.root.join(STATE_FILE);
        let mut file = File::open(path).ok()?;
        let mut buf = String::new();
        file.read_to_string(&mut buf).ok()?;

        let value: Value = match serde_json::from_str(&buf) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("discarding malformed state file: {err}");
                return None;
            }
        };
        if !has_valid_shape(&value) {
            log::warn!("discarding structurally invalid state file");
            return None;
        }

        let value = migrate::upgrade(value);
        match serde_json::from_value(value) {
            Ok(state) => Some(state),
            Err(err) => {
                log::warn!("discarding undeserializable state file: {err}");
                None
            }
        }
    }

    pub fn save_state(&self, state: &PersistedState) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(STATE_FILE), state)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

/// A usable blob must carry a `lists` array and a non-empty `activeListId`.
fn has_valid_shape(value: &Value) -> bool {
    let lists_ok = value.get("lists").map(Value::is_array).unwrap_or(false);
    let active_ok = value
        .get("activeListId")
        .and_then(Value::as_str)
        .map(|id| !id.is_empty())
        .unwrap_or(false);
    lists_ok && active_ok
}
