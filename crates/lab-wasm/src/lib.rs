//! WebAssembly entry point for Stabilize the Lab
//!
//! The JS UI owns screens, timers and animation. This crate owns which set
//! a group plays, whether a code is right, and what gets persisted.
//! Session progress lives in sessionStorage (survives a refresh), admin
//! settings and the offline leaderboard copy in localStorage.

use lab_core::catalog::{self, Puzzle, ReactionKind, SetId};
use lab_core::leaderboard::format_elapsed;
use lab_core::{AssignmentMode, EscapeRoom, GroupInfo, LeaderboardBackend};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

mod logger;
mod remote;
mod storage;

// WASM tests require wasm-pack test to run
#[cfg(all(test, target_arch = "wasm32"))]
mod tests;

pub use remote::RemoteLeaderboard;
pub use storage::WebStorage;

// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);
}

/// Turn on debug-level console output
#[wasm_bindgen]
pub fn set_verbose_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logger::init(level);
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

fn parse_puzzle(number: u8) -> Option<Puzzle> {
    Puzzle::from_number(number as usize)
}

/// The controller the JS UI talks to
#[wasm_bindgen]
pub struct StabilizeLab {
    room: EscapeRoom<WebStorage>,
    leaderboard: RemoteLeaderboard,
}

#[wasm_bindgen]
impl StabilizeLab {
    /// Open the room, resuming a session left in this tab.
    ///
    /// `api_base` defaults to `/api`; `admin_pin` replaces the built-in PIN.
    #[wasm_bindgen(constructor)]
    pub fn new(api_base: Option<String>, admin_pin: Option<String>) -> StabilizeLab {
        let mut room = EscapeRoom::new(WebStorage::local(), WebStorage::session());
        if let Some(pin) = admin_pin.filter(|p| !p.is_empty()) {
            room = room.with_pin(pin);
        }
        StabilizeLab {
            room,
            leaderboard: RemoteLeaderboard::new(api_base),
        }
    }

    // ==================== Run ====================

    /// Current stage name, e.g. `"Puzzle2Active"`
    pub fn stage(&self) -> String {
        format!("{:?}", self.room.stage())
    }

    /// Re-read the session (another tab or the admin page may have changed it)
    pub fn resume(&mut self) -> String {
        format!("{:?}", self.room.resume())
    }

    /// Assigned set, if a group is playing
    pub fn set_id(&self) -> Option<String> {
        self.room.set_id().map(|s| s.to_string())
    }

    pub fn group_name(&self) -> Option<String> {
        self.room.session().map(|s| s.group_name.clone())
    }

    /// Validate the setup form without starting anything.
    /// Returns an error message, or `None` when the form is fine.
    pub fn check_group(&self, name: &str, players: u8, block: &str) -> Option<String> {
        GroupInfo::new(name, players, block)
            .validate()
            .err()
            .map(|e| e.to_string())
    }

    /// Countdown finished: assign a set and open puzzle 1
    pub fn begin(&mut self, name: &str, players: u8, block: &str) -> Result<String, JsValue> {
        let group = GroupInfo::new(name, players, block)
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(self.room.begin(&group, now_ms()).to_string())
    }

    /// Content of the assigned set as a JS object
    pub fn puzzle_set(&self) -> Result<JsValue, JsValue> {
        let set = self
            .room
            .puzzle_set()
            .ok_or_else(|| JsValue::from_str("No active group"))?;
        serde_wasm_bindgen::to_value(set).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Submit a code for puzzle 1, 2 or 3
    pub fn submit_code(&mut self, puzzle: u8, code: &str) -> bool {
        match parse_puzzle(puzzle) {
            Some(p) => self.room.submit_code(p, code),
            None => false,
        }
    }

    /// Submit the puzzle 3 board, `{ comb: "heat", acid: "aq", ... }`.
    /// Returns the earned code on success.
    pub fn submit_matches(&mut self, matches: JsValue) -> Option<String> {
        let raw: HashMap<String, String> = serde_wasm_bindgen::from_value(matches).ok()?;
        let mut board = HashMap::new();
        for (kind, condition) in raw {
            board.insert(ReactionKind::from_id(&kind)?, condition);
        }
        self.room.submit_matches(&board)
    }

    pub fn submit_final(&mut self, code: &str) -> bool {
        self.room.submit_final(code, now_ms())
    }

    /// Codes recorded so far as `{p1, p2, p3}` JSON
    pub fn codes_json(&self) -> String {
        serde_json::to_string(&self.room.codes()).unwrap_or_default()
    }

    /// Hint `level` (1-3) for a puzzle of the assigned set
    pub fn hint(&self, puzzle: u8, level: usize) -> Option<String> {
        let set = self.room.puzzle_set()?;
        set.hint(parse_puzzle(puzzle)?, level)
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.room.elapsed_seconds(now_ms()) as u32
    }

    /// Elapsed time as `M:SS`
    pub fn elapsed_string(&self) -> String {
        format_elapsed(self.room.elapsed_seconds(now_ms()))
    }

    /// Submit the finished run and clear the session. The request runs in
    /// the background; the returned entry JSON is available immediately.
    pub fn submit_to_leaderboard(&mut self) -> Option<String> {
        let entry = self.room.finish(&self.leaderboard, now_ms())?;
        serde_json::to_string(&entry).ok()
    }

    // ==================== Leaderboard ====================

    /// Locally mirrored leaderboard as JSON, fastest first
    pub fn leaderboard_json(&self) -> String {
        let entries = self.leaderboard.list().unwrap_or_default();
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Fetch the server leaderboard. Resolves to an array of entries, the
    /// local copy when the server can't be reached.
    pub fn refresh_leaderboard(&self) -> js_sys::Promise {
        let leaderboard = self.leaderboard.clone();
        future_to_promise(async move {
            let entries = leaderboard.refresh().await;
            serde_wasm_bindgen::to_value(&entries).map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    // ==================== Admin ====================

    pub fn admin_unlock(&self, pin: &str) -> bool {
        self.room.admin().unlock(pin)
    }

    pub fn admin_logout(&self) {
        self.room.admin().logout();
    }

    pub fn admin_is_authenticated(&self) -> bool {
        self.room.admin().is_authenticated()
    }

    /// Current admin settings as JSON
    pub fn admin_settings_json(&self) -> String {
        serde_json::to_string(&self.room.admin().load()).unwrap_or_default()
    }

    /// Whether the footer should show the `Set: X` badge
    pub fn debug_overlay(&self) -> bool {
        self.room.admin().load().debug_overlay_enabled
    }

    /// `"random"` or `"manual"`
    pub fn admin_set_mode(&self, mode: &str) -> bool {
        let mode = match mode {
            "random" => AssignmentMode::Random,
            "manual" => AssignmentMode::Manual,
            _ => return false,
        };
        match self.room.admin().panel() {
            Some(panel) => {
                panel.set_mode(mode);
                true
            }
            None => false,
        }
    }

    pub fn admin_set_manual_set(&self, set_id: &str) -> bool {
        let Ok(set_id) = set_id.parse::<SetId>() else {
            return false;
        };
        match self.room.admin().panel() {
            Some(panel) => {
                panel.set_manual_set(set_id);
                true
            }
            None => false,
        }
    }

    /// Advance the manual set; returns the new one
    pub fn admin_rotate_manual_set(&self) -> Option<String> {
        let panel = self.room.admin().panel()?;
        Some(panel.rotate_manual_set().to_string())
    }

    pub fn admin_toggle_exclude_last(&self) -> Option<bool> {
        Some(self.room.admin().panel()?.toggle_exclude_last())
    }

    pub fn admin_toggle_debug_overlay(&self) -> Option<bool> {
        Some(self.room.admin().panel()?.toggle_debug_overlay())
    }

    /// Drop the current group's session; the leaderboard is kept
    pub fn admin_reset_session(&mut self) -> bool {
        self.room.reset_session()
    }

    /// Wipe the leaderboard. Resolves to `false` without an unlocked panel
    /// or when the server refuses.
    pub fn admin_clear_leaderboard(&self) -> js_sys::Promise {
        if self.room.admin().panel().is_none() {
            return js_sys::Promise::resolve(&JsValue::from_bool(false));
        }
        let leaderboard = self.leaderboard.clone();
        future_to_promise(async move {
            let cleared = match leaderboard.clear_remote().await {
                Ok(()) => {
                    log::info!("[ADMIN] leaderboard cleared backend:{}", leaderboard.backend_name());
                    true
                }
                Err(e) => {
                    log::error!("[ADMIN] leaderboard clear failed err:{}", e);
                    false
                }
            };
            Ok(JsValue::from_bool(cleared))
        })
    }

    /// Expected codes per set as JSON rows `{set, p1, p2, p3, final}`
    pub fn admin_preview_json(&self) -> Option<String> {
        self.room.admin().panel()?;
        serde_json::to_string(&catalog::preview()).ok()
    }
}
