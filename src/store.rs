//! Last-known-place persistence behind a key-value port.
//!
//! The CLI remembers the last observer location it evaluated so a bare
//! `skyarc` invocation works without coordinates. Storage is injected through
//! [`KeyValueStore`]; [`FileStore`] keeps a small JSON object under
//! `$XDG_STATE_HOME/skyarc/` and [`MemoryStore`] backs tests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::common::constants::LAST_PLACE_KEY;
use crate::events::Coordinates;

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on every `set`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_STATE_HOME/skyarc/store.json`, falling back to `~/.local/state`.
    pub fn default_path() -> Result<PathBuf> {
        let state_home = match std::env::var("XDG_STATE_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".local/state"),
        };
        Ok(state_home.join("skyarc").join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // An unreadable store is replaced rather than blocking new writes
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// An observer location as remembered between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Place {
    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// The remembered place, if one was stored and is still valid.
pub fn load_last_place(store: &dyn KeyValueStore) -> Result<Option<Place>> {
    let Some(raw) = store.get(LAST_PLACE_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<Place>(&raw) {
        Ok(place) if place.coordinates().is_ok() => Ok(Some(place)),
        _ => {
            log_warning!("Ignoring unreadable last-known place");
            Ok(None)
        }
    }
}

pub fn save_last_place(store: &dyn KeyValueStore, place: &Place) -> Result<()> {
    let raw = serde_json::to_string(place)?;
    store.set(LAST_PLACE_KEY, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn norfolk() -> Place {
        Place {
            latitude: 36.8529,
            longitude: -75.978,
            timezone: "America/New_York".to_string(),
            label: Some("New York".to_string()),
        }
    }

    #[test]
    fn test_memory_store_round_trip_place() {
        let store = MemoryStore::new();
        assert_eq!(load_last_place(&store).unwrap(), None);

        save_last_place(&store, &norfolk()).unwrap();
        assert_eq!(load_last_place(&store).unwrap(), Some(norfolk()));
    }

    #[test]
    fn test_file_store_persists_between_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        FileStore::new(&path).set("greeting", "hello").unwrap();
        FileStore::new(&path).set("other", "value").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("greeting").unwrap().as_deref(), Some("hello"));
        assert_eq!(store.get("other").unwrap().as_deref(), Some("value"));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_replaced_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert!(store.get("anything").is_err());
        store.set("anything", "ok").unwrap();
        assert_eq!(store.get("anything").unwrap().as_deref(), Some("ok"));
    }

    #[test]
    fn test_invalid_stored_place_is_ignored() {
        let store = MemoryStore::new();
        store
            .set(LAST_PLACE_KEY, r#"{"latitude":123.0,"longitude":0.0,"timezone":"UTC"}"#)
            .unwrap();
        assert_eq!(load_last_place(&store).unwrap(), None);

        store.set(LAST_PLACE_KEY, "garbage").unwrap();
        assert_eq!(load_last_place(&store).unwrap(), None);
    }
}
