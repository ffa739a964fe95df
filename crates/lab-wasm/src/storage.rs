//! Browser storage as a key-value store

use lab_core::{KeyValueStore, StoreError};

/// `localStorage` or `sessionStorage`.
///
/// When the browser refuses storage (private mode, sandboxed iframe) reads
/// come back empty and writes report [`StoreError::Unavailable`].
#[derive(Debug, Clone)]
pub struct WebStorage {
    storage: Option<web_sys::Storage>,
}

impl WebStorage {
    /// Survives until explicitly cleared
    pub fn local() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("[STORE] localStorage unavailable");
        }
        Self { storage }
    }

    /// Survives reloads, gone when the tab closes
    pub fn session() -> Self {
        let storage = web_sys::window().and_then(|w| w.session_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("[STORE] sessionStorage unavailable");
        }
        Self { storage }
    }
}

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::Io(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage
            .remove_item(key)
            .map_err(|e| StoreError::Io(format!("{:?}", e)))
    }
}
