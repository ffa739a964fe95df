//! Key-value persistence contract
//!
//! The core never touches a concrete storage medium. Front-ends supply a
//! [`KeyValueStore`]: browser `sessionStorage`/`localStorage` on the web,
//! JSON files on the kiosk, [`MemoryStore`] in tests.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Storage key for the current group's session
pub const SESSION_KEY: &str = "stabilizeLabSession";
/// Storage key for admin settings
pub const ADMIN_KEY: &str = "stabilizeLabAdmin";
/// Storage key for the offline leaderboard copy
pub const LEADERBOARD_KEY: &str = "chemistry-escape-leaderboard";

/// Errors that can occur when writing to a store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing medium failed (disk, quota, ...)
    #[error("Storage I/O error: {0}")]
    Io(String),
    /// The value could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// The backing medium is not reachable at all
    #[error("Storage unavailable")]
    Unavailable,
}

/// String-valued key-value store holding JSON documents
pub trait KeyValueStore {
    /// Raw value under `key`, `None` when absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Read and decode a JSON value.
///
/// A missing key yields `None`. A value that fails to parse also yields
/// `None` (callers fall back to their defaults) and is logged.
pub fn load_json<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("[STORE] unreadable value key:{} err:{}", key, e);
            None
        }
    }
}

/// Encode a value as JSON and store it
pub fn save_json<T: Serialize>(
    store: &impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value).map_err(|e| StoreError::Serialize(e.to_string()))?;
    store.set(key, &json)
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.data
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.data.borrow_mut().remove(key);
        Ok(())
    }
}
