// src/caller.rs
// Client-local caller session: items are drawn at random without replacement
// and the called/uncalled split survives restarts through a key-value store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::defs::{CALLED_ITEMS_KEY, UNCALLED_ITEMS_KEY};
use crate::logging::log_warning;
use crate::models::ItemSnapshot;

/// Minimal persistence used by the caller; both keys of a session are
/// always written through a single `set_many` call.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set_many(&self, entries: &[(String, String)]) -> std::io::Result<()>;
    fn remove_many(&self, keys: &[String]) -> std::io::Result<()>;
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
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set_many(&self, entries: &[(String, String)]) -> std::io::Result<()> {
        let mut map = self.entries.lock().map_err(|_| std::io::Error::other("memory store lock poisoned"))?;
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[String]) -> std::io::Result<()> {
        let mut map = self.entries.lock().map_err(|_| std::io::Error::other("memory store lock poisoned"))?;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }
}

/// Key-value store kept as one JSON object on disk. Writes go to a sibling
/// temp file that is renamed over the original.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    fn read_all(&self) -> HashMap<String, String> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log_warning(&format!("Ignoring unreadable caller state file {}: {e}", self.path.display()));
            HashMap::new()
        })
    }

    fn write_all(&self, map: &HashMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        fs::rename(&tmp, &self.path)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set_many(&self, entries: &[(String, String)]) -> std::io::Result<()> {
        let mut map = self.read_all();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        self.write_all(&map)
    }

    fn remove_many(&self, keys: &[String]) -> std::io::Result<()> {
        let mut map = self.read_all();
        for key in keys {
            map.remove(key);
        }
        self.write_all(&map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Called(ItemSnapshot),
    /// Nothing left to call; the state is unchanged
    Exhausted,
}

/// The two halves of a caller session. Every item of the session is in
/// exactly one of `called` or `uncalled`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallerState {
    called: Vec<ItemSnapshot>,
    uncalled: Vec<ItemSnapshot>,
}

fn storage_keys(game_id: &str) -> (String, String) {
    (format!("{CALLED_ITEMS_KEY}:{game_id}"), format!("{UNCALLED_ITEMS_KEY}:{game_id}"))
}

impl CallerState {
    /// Fresh session: nothing called yet
    pub fn new(items: Vec<ItemSnapshot>) -> Self {
        Self { called: Vec::new(), uncalled: items }
    }

    /// Load the stored session for a game, falling back to a fresh one when
    /// either key is missing or does not parse.
    pub fn restore(store: &dyn KeyValueStore, game_id: &str, items: Vec<ItemSnapshot>) -> Self {
        let (called_key, uncalled_key) = storage_keys(game_id);
        let (Some(called_raw), Some(uncalled_raw)) = (store.get(&called_key), store.get(&uncalled_key)) else {
            return Self::new(items);
        };

        match (
            serde_json::from_str::<Vec<ItemSnapshot>>(&called_raw),
            serde_json::from_str::<Vec<ItemSnapshot>>(&uncalled_raw),
        ) {
            (Ok(called), Ok(uncalled)) => Self { called, uncalled },
            (Err(e), _) | (_, Err(e)) => {
                log_warning(&format!("Stored caller state for game {game_id} is corrupt ({e}); starting over"));
                Self::new(items)
            }
        }
    }

    /// Write both halves together
    pub fn save(&self, store: &dyn KeyValueStore, game_id: &str) -> std::io::Result<()> {
        let (called_key, uncalled_key) = storage_keys(game_id);
        store.set_many(&[
            (called_key, serde_json::to_string(&self.called)?),
            (uncalled_key, serde_json::to_string(&self.uncalled)?),
        ])
    }

    /// Drop the stored session for a game
    pub fn clear(store: &dyn KeyValueStore, game_id: &str) -> std::io::Result<()> {
        let (called_key, uncalled_key) = storage_keys(game_id);
        store.remove_many(&[called_key, uncalled_key])
    }

    /// Start over with a new item set (not an undo)
    pub fn reset(&mut self, items: Vec<ItemSnapshot>) {
        self.called.clear();
        self.uncalled = items;
    }

    /// Draw one uncalled item uniformly at random and append it to the call history
    pub fn call_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> CallOutcome {
        if self.uncalled.is_empty() {
            return CallOutcome::Exhausted;
        }
        let index = rng.random_range(0..self.uncalled.len());
        let item = self.uncalled.remove(index);
        self.called.push(item.clone());
        CallOutcome::Called(item)
    }

    pub fn called(&self) -> &[ItemSnapshot] {
        &self.called
    }

    pub fn uncalled(&self) -> &[ItemSnapshot] {
        &self.uncalled
    }

    pub fn last_called(&self) -> Option<&ItemSnapshot> {
        self.called.last()
    }

    pub fn remaining(&self) -> usize {
        self.uncalled.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.uncalled.is_empty()
    }
}
