//! Group session and progress state
//!
//! One session per active group, kept in a tab-scoped store so a refresh
//! resumes the same set and puzzle. Cleared after leaderboard submission;
//! abandoned sessions are overwritten by the next group.

use crate::catalog::{Puzzle, SetId};
use crate::store::{self, KeyValueStore, StoreError, SESSION_KEY};
use crate::validate::PuzzleCodes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest group the room is designed for
pub const MAX_PLAYERS: u8 = 10;
/// Players pre-filled on the setup form
pub const DEFAULT_PLAYERS: u8 = 3;

/// Where a group is in the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    NotStarted,
    Puzzle1Active,
    Puzzle2Active,
    Puzzle3Active,
    FinalActive,
    Completed,
}

impl Stage {
    /// Stage in which `puzzle` is being played
    pub fn for_puzzle(puzzle: Puzzle) -> Stage {
        match puzzle {
            Puzzle::ReactionLogic => Stage::Puzzle1Active,
            Puzzle::PeriodicTable => Stage::Puzzle2Active,
            Puzzle::ReactionConditions => Stage::Puzzle3Active,
        }
    }

    pub fn active_puzzle(self) -> Option<Puzzle> {
        match self {
            Stage::Puzzle1Active => Some(Puzzle::ReactionLogic),
            Stage::Puzzle2Active => Some(Puzzle::PeriodicTable),
            Stage::Puzzle3Active => Some(Puzzle::ReactionConditions),
            _ => None,
        }
    }

    /// Stage after the current one was solved
    pub fn advance(self) -> Stage {
        match self {
            Stage::Puzzle1Active => Stage::Puzzle2Active,
            Stage::Puzzle2Active => Stage::Puzzle3Active,
            Stage::Puzzle3Active => Stage::FinalActive,
            Stage::FinalActive => Stage::Completed,
            other => other,
        }
    }

    /// Rebuild the stage after a reload: first incomplete puzzle, or the
    /// final entry once all three are done.
    pub fn resume(session: Option<&SessionData>) -> Stage {
        let Some(session) = session else {
            return Stage::NotStarted;
        };
        Puzzle::ALL
            .into_iter()
            .find(|&p| !session.is_complete(p))
            .map(Stage::for_puzzle)
            .unwrap_or(Stage::FinalActive)
    }
}

/// Setup form errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Group name is required")]
    EmptyName,
    #[error("Player count must be between 1 and {max}, got {0}", max = MAX_PLAYERS)]
    PlayerCount(u8),
}

/// Details entered on the setup form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
    pub players: u8,
    pub block: String,
}

impl GroupInfo {
    pub fn new(name: impl Into<String>, players: u8, block: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            players,
            block: block.into(),
        }
    }

    /// Trim the name and check the player count
    pub fn validate(self) -> Result<GroupInfo, SetupError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(SetupError::EmptyName);
        }
        if !(1..=MAX_PLAYERS).contains(&self.players) {
            return Err(SetupError::PlayerCount(self.players));
        }
        Ok(GroupInfo {
            name,
            players: self.players,
            block: self.block.trim().to_string(),
        })
    }
}

/// Persisted state of one group's run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub group_name: String,
    pub players: u8,
    pub block: String,
    pub set_id: SetId,
    /// Unix time in milliseconds when puzzle 1 opened
    pub started_at: u64,
    #[serde(default)]
    pub p1_complete: bool,
    #[serde(default)]
    pub p2_complete: bool,
    #[serde(default)]
    pub p3_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p1_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p3_code: Option<String>,
}

impl SessionData {
    pub fn new(group: &GroupInfo, set_id: SetId, started_at: u64) -> Self {
        Self {
            group_name: group.name.clone(),
            players: group.players,
            block: group.block.clone(),
            set_id,
            started_at,
            p1_complete: false,
            p2_complete: false,
            p3_complete: false,
            p1_code: None,
            p2_code: None,
            p3_code: None,
        }
    }

    pub fn is_complete(&self, puzzle: Puzzle) -> bool {
        match puzzle {
            Puzzle::ReactionLogic => self.p1_complete,
            Puzzle::PeriodicTable => self.p2_complete,
            Puzzle::ReactionConditions => self.p3_complete,
        }
    }

    pub fn code(&self, puzzle: Puzzle) -> Option<&str> {
        match puzzle {
            Puzzle::ReactionLogic => self.p1_code.as_deref(),
            Puzzle::PeriodicTable => self.p2_code.as_deref(),
            Puzzle::ReactionConditions => self.p3_code.as_deref(),
        }
    }

    /// Mark `puzzle` complete with the code the group entered
    pub fn record(&mut self, puzzle: Puzzle, code: &str) {
        let (complete, slot) = match puzzle {
            Puzzle::ReactionLogic => (&mut self.p1_complete, &mut self.p1_code),
            Puzzle::PeriodicTable => (&mut self.p2_complete, &mut self.p2_code),
            Puzzle::ReactionConditions => (&mut self.p3_complete, &mut self.p3_code),
        };
        *complete = true;
        *slot = Some(code.to_string());
    }

    /// Recorded codes, empty where a puzzle is still open
    pub fn codes(&self) -> PuzzleCodes {
        PuzzleCodes {
            p1: self.p1_code.clone().unwrap_or_default(),
            p2: self.p2_code.clone().unwrap_or_default(),
            p3: self.p3_code.clone().unwrap_or_default(),
        }
    }

    pub fn stage(&self) -> Stage {
        Stage::resume(Some(self))
    }
}

/// Session persistence over a key-value store
#[derive(Debug, Clone)]
pub struct SessionStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current session; corrupt data reads as no session
    pub fn load(&self) -> Option<SessionData> {
        store::load_json(&self.store, SESSION_KEY)
    }

    pub fn save(&self, session: &SessionData) -> Result<(), StoreError> {
        store::save_json(&self.store, SESSION_KEY, session)
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(SESSION_KEY) {
            log::error!("[SESSION] failed to clear err:{}", e);
        }
    }

    /// Record a solved puzzle. Does nothing without a session.
    pub fn update_progress(&self, puzzle: Puzzle, code: &str) -> Option<SessionData> {
        let mut session = self.load()?;
        session.record(puzzle, code);
        if let Err(e) = self.save(&session) {
            log::error!("[SESSION] failed to save progress err:{}", e);
        }
        Some(session)
    }
}
