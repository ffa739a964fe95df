//! Admin settings and the PIN gate
//!
//! Settings live under one key and are created with defaults on first
//! read. They only change through explicit admin actions and never expire.

use crate::assign::{self, SetAssigner};
use crate::catalog::SetId;
use crate::store::{self, KeyValueStore, StoreError, ADMIN_KEY};
use serde::{Deserialize, Serialize};

/// PIN used when no override is configured
pub const DEFAULT_ADMIN_PIN: &str = "1010";

/// How new groups receive a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    Random,
    Manual,
}

impl Default for AssignmentMode {
    fn default() -> Self {
        Self::Random
    }
}

/// Process-wide assignment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminSettings {
    #[serde(rename = "authed")]
    pub authenticated: bool,
    pub mode: AssignmentMode,
    pub manual_set_id: SetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_assigned_set_id: Option<SetId>,
    pub exclude_last_in_random: bool,
    #[serde(rename = "debugOverlay")]
    pub debug_overlay_enabled: bool,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            authenticated: false,
            mode: AssignmentMode::Random,
            manual_set_id: SetId::A,
            last_assigned_set_id: None,
            exclude_last_in_random: false,
            debug_overlay_enabled: false,
        }
    }
}

/// Persisted admin settings over a key-value store
#[derive(Debug, Clone)]
pub struct AdminStore<S: KeyValueStore> {
    store: S,
    pin: String,
}

impl<S: KeyValueStore> AdminStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            pin: DEFAULT_ADMIN_PIN.to_string(),
        }
    }

    /// Replace the admin PIN
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = pin.into();
        self
    }

    /// Current settings; missing or corrupt data reads as defaults
    pub fn load(&self) -> AdminSettings {
        store::load_json(&self.store, ADMIN_KEY).unwrap_or_default()
    }

    pub fn save(&self, settings: &AdminSettings) -> Result<(), StoreError> {
        store::save_json(&self.store, ADMIN_KEY, settings)
    }

    /// Load, apply `f`, save. Returns the settings as written.
    pub fn update(&self, f: impl FnOnce(&mut AdminSettings)) -> AdminSettings {
        let mut settings = self.load();
        f(&mut settings);
        if let Err(e) = self.save(&settings) {
            log::error!("[ADMIN] failed to save settings err:{}", e);
        }
        settings
    }

    /// Pick and persist the set for a group whose countdown just finished
    pub fn assign_set_for_new_group(&self, assigner: &mut SetAssigner) -> SetId {
        let mut chosen = SetId::A;
        let settings = self.update(|s| chosen = assigner.assign(s));
        log::info!(
            "[ASSIGN] set:{} mode:{:?} exclude_last:{}",
            chosen,
            settings.mode,
            settings.exclude_last_in_random
        );
        chosen
    }

    /// Advance the manual set cyclically and persist it
    pub fn rotate_manual_set(&self) -> SetId {
        self.update(|s| {
            assign::rotate_manual_set(s);
        })
        .manual_set_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().authenticated
    }

    /// Compare `pin` with the configured PIN; a match stays logged in until
    /// [`AdminStore::logout`].
    pub fn unlock(&self, pin: &str) -> bool {
        if pin != self.pin {
            log::warn!("[ADMIN] rejected pin attempt");
            return false;
        }
        self.update(|s| s.authenticated = true);
        log::info!("[ADMIN] unlocked");
        true
    }

    pub fn logout(&self) {
        self.update(|s| s.authenticated = false);
        log::info!("[ADMIN] logged out");
    }

    /// Settings actions, available only while logged in
    pub fn panel(&self) -> Option<AdminPanel<'_, S>> {
        if self.is_authenticated() {
            Some(AdminPanel { admin: self })
        } else {
            log::warn!("[ADMIN] action refused, not authenticated");
            None
        }
    }
}

/// Authenticated handle for changing settings
pub struct AdminPanel<'a, S: KeyValueStore> {
    admin: &'a AdminStore<S>,
}

impl<S: KeyValueStore> AdminPanel<'_, S> {
    pub fn set_mode(&self, mode: AssignmentMode) -> AdminSettings {
        log::info!("[ADMIN] mode:{:?}", mode);
        self.admin.update(|s| s.mode = mode)
    }

    pub fn set_manual_set(&self, set_id: SetId) -> AdminSettings {
        log::info!("[ADMIN] manual set:{}", set_id);
        self.admin.update(|s| s.manual_set_id = set_id)
    }

    pub fn rotate_manual_set(&self) -> SetId {
        let next = self.admin.rotate_manual_set();
        log::info!("[ADMIN] rotated manual set:{}", next);
        next
    }

    pub fn toggle_exclude_last(&self) -> bool {
        self.admin
            .update(|s| s.exclude_last_in_random = !s.exclude_last_in_random)
            .exclude_last_in_random
    }

    pub fn toggle_debug_overlay(&self) -> bool {
        self.admin
            .update(|s| s.debug_overlay_enabled = !s.debug_overlay_enabled)
            .debug_overlay_enabled
    }
}
