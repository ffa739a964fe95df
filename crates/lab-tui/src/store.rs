//! Kiosk storage
//!
//! Each key is one JSON file in the data dir, so `stabilizeLabAdmin` lands
//! in `stabilizeLabAdmin.json` with the same content the browser keeps in
//! localStorage.

use crate::config::{Environment, LabConfig};
use lab_core::{
    KeyValueStore, LeaderboardBackend, MemoryLeaderboard, MemoryStore, StoreError,
    StoreLeaderboard,
};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Key-value store backed by a directory of files
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("[STORE] read failed key:{} err:{}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::write(self.path(key), value).map_err(|e| StoreError::Io(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

/// Whichever store the environment asks for
#[derive(Debug, Clone)]
pub enum KioskStore {
    File(FileStore),
    Memory(MemoryStore),
}

impl KeyValueStore for KioskStore {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            KioskStore::File(s) => s.get(key),
            KioskStore::Memory(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            KioskStore::File(s) => s.set(key, value),
            KioskStore::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            KioskStore::File(s) => s.remove(key),
            KioskStore::Memory(s) => s.remove(key),
        }
    }
}

/// Open the store for `config`. Admin settings, session and leaderboard
/// share it; the keys keep them apart.
pub fn open_store(config: &LabConfig) -> KioskStore {
    match config.env {
        Environment::Local => KioskStore::File(FileStore::new(&config.data_dir)),
        Environment::Test => KioskStore::Memory(MemoryStore::new()),
    }
}

/// Create the leaderboard backend for `config`
pub fn create_leaderboard(config: &LabConfig, store: &KioskStore) -> Box<dyn LeaderboardBackend> {
    match config.env {
        Environment::Local => Box::new(StoreLeaderboard::new(store.clone())),
        Environment::Test => Box::new(MemoryLeaderboard::new()),
    }
}
