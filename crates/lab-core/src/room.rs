//! Escape room run controller
//!
//! Ties the stores, the assigner and the validators together for the one
//! group currently at the station. Everything is synchronous; the only
//! outside call is the best-effort leaderboard submission in
//! [`EscapeRoom::finish`].

use crate::admin::AdminStore;
use crate::assign::SetAssigner;
use crate::catalog::{get_set, Puzzle, PuzzleSet, ReactionKind, SetId};
use crate::leaderboard::{self, LeaderboardBackend, LeaderboardEntry};
use crate::session::{GroupInfo, SessionData, SessionStore, Stage};
use crate::store::KeyValueStore;
use crate::validate::{self, PuzzleCodes};
use std::collections::HashMap;

pub struct EscapeRoom<S: KeyValueStore> {
    admin: AdminStore<S>,
    sessions: SessionStore<S>,
    assigner: SetAssigner,
    /// In-memory mirror of the persisted session
    session: Option<SessionData>,
    stage: Stage,
    completed_at: Option<u64>,
}

impl<S: KeyValueStore> EscapeRoom<S> {
    /// Open the room over an admin store (long-lived) and a session store
    /// (tab-scoped), resuming any session already in progress.
    pub fn new(admin_store: S, session_store: S) -> Self {
        let mut room = Self {
            admin: AdminStore::new(admin_store),
            sessions: SessionStore::new(session_store),
            assigner: SetAssigner::new(),
            session: None,
            stage: Stage::NotStarted,
            completed_at: None,
        };
        room.resume();
        room
    }

    pub fn with_assigner(mut self, assigner: SetAssigner) -> Self {
        self.assigner = assigner;
        self
    }

    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.admin = self.admin.with_pin(pin);
        self
    }

    pub fn admin(&self) -> &AdminStore<S> {
        &self.admin
    }

    /// Reload the session from storage and rebuild the stage
    pub fn resume(&mut self) -> Stage {
        self.session = self.sessions.load();
        self.stage = Stage::resume(self.session.as_ref());
        self.completed_at = None;
        if let Some(s) = &self.session {
            log::info!(
                "[SESSION] resumed group:{} set:{} stage:{:?}",
                s.group_name,
                s.set_id,
                self.stage
            );
        }
        self.stage
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn session(&self) -> Option<&SessionData> {
        self.session.as_ref()
    }

    pub fn set_id(&self) -> Option<SetId> {
        self.session.as_ref().map(|s| s.set_id)
    }

    /// Content of the assigned set
    pub fn puzzle_set(&self) -> Option<&'static PuzzleSet> {
        self.set_id().map(get_set)
    }

    /// Codes recorded so far
    pub fn codes(&self) -> PuzzleCodes {
        self.session
            .as_ref()
            .map(SessionData::codes)
            .unwrap_or_default()
    }

    /// Countdown finished: assign a set and open puzzle 1.
    ///
    /// This is the only place a set is assigned, so a setup that is
    /// abandoned before the countdown ends never consumes a rotation slot.
    pub fn begin(&mut self, group: &GroupInfo, now_ms: u64) -> SetId {
        let set_id = self.admin.assign_set_for_new_group(&mut self.assigner);
        let session = SessionData::new(group, set_id, now_ms);
        if let Err(e) = self.sessions.save(&session) {
            log::error!("[SESSION] failed to save new session err:{}", e);
        }
        log::info!(
            "[SESSION] started group:{} players:{} set:{}",
            group.name,
            group.players,
            set_id
        );

        self.session = Some(session);
        self.stage = Stage::Puzzle1Active;
        self.completed_at = None;
        set_id
    }

    /// Submit a code for `puzzle`. Only the active puzzle can be solved;
    /// a correct code is recorded exactly as typed and the run advances.
    pub fn submit_code(&mut self, puzzle: Puzzle, code: &str) -> bool {
        if self.stage.active_puzzle() != Some(puzzle) {
            return false;
        }
        let Some(set_id) = self.set_id() else {
            return false;
        };
        if !validate::is_correct(set_id, puzzle, code) {
            log::debug!("[SESSION] wrong code puzzle:{} set:{}", puzzle.number(), set_id);
            return false;
        }

        self.record(puzzle, code);
        true
    }

    /// Submit the puzzle 3 matching board. On success the earned code is
    /// recorded and returned.
    pub fn submit_matches(&mut self, matches: &HashMap<ReactionKind, String>) -> Option<String> {
        if self.stage.active_puzzle() != Some(Puzzle::ReactionConditions) {
            return None;
        }
        let code = validate::check_matches(self.set_id()?, matches)?;
        self.record(Puzzle::ReactionConditions, &code);
        Some(code)
    }

    /// Submit the master unlock string, checked against the group's own
    /// recorded codes.
    pub fn submit_final(&mut self, code: &str, now_ms: u64) -> bool {
        if self.stage != Stage::FinalActive {
            return false;
        }
        if !validate::is_final_correct(&self.codes(), code) {
            return false;
        }

        self.stage = self.stage.advance();
        self.completed_at = Some(now_ms);
        if let Some(s) = &self.session {
            log::info!(
                "[SESSION] completed group:{} set:{} secs:{}",
                s.group_name,
                s.set_id,
                leaderboard::elapsed_seconds(s.started_at, now_ms)
            );
        }
        true
    }

    /// Seconds on the clock; frozen once the final code is accepted
    pub fn elapsed_seconds(&self, now_ms: u64) -> u64 {
        let Some(s) = &self.session else {
            return 0;
        };
        leaderboard::elapsed_seconds(s.started_at, self.completed_at.unwrap_or(now_ms))
    }

    /// Submit the finished run to `sink` and close the session.
    ///
    /// The session is cleared whether or not the sink accepted the entry.
    /// Returns the entry built, or `None` if the run is not complete.
    pub fn finish(
        &mut self,
        sink: &dyn LeaderboardBackend,
        now_ms: u64,
    ) -> Option<LeaderboardEntry> {
        if self.stage != Stage::Completed {
            return None;
        }
        let session = self.session.as_ref()?;
        let entry = LeaderboardEntry::new(
            &session.group_name,
            self.elapsed_seconds(now_ms),
            &leaderboard::date_string(now_ms),
            session.set_id,
        );

        leaderboard::submit_best_effort(sink, entry.clone());
        self.close_session();
        Some(entry)
    }

    /// Admin: drop the current group's session. The leaderboard is kept.
    pub fn reset_session(&mut self) -> bool {
        if self.admin.panel().is_none() {
            return false;
        }
        self.close_session();
        log::info!("[ADMIN] session reset");
        true
    }

    /// Admin: wipe the leaderboard
    pub fn clear_leaderboard(&self, sink: &dyn LeaderboardBackend) -> bool {
        if self.admin.panel().is_none() {
            return false;
        }
        match sink.clear() {
            Ok(()) => {
                log::info!("[ADMIN] leaderboard cleared backend:{}", sink.backend_name());
                true
            }
            Err(e) => {
                log::error!("[ADMIN] leaderboard clear failed err:{}", e);
                false
            }
        }
    }

    fn record(&mut self, puzzle: Puzzle, code: &str) {
        if let Some(session) = self.session.as_mut() {
            match self.sessions.update_progress(puzzle, code) {
                Some(updated) => *session = updated,
                None => {
                    // Stored copy went missing; carry on from memory
                    session.record(puzzle, code);
                    if let Err(e) = self.sessions.save(session) {
                        log::error!("[SESSION] failed to save progress err:{}", e);
                    }
                }
            }
            log::info!(
                "[SESSION] solved puzzle:{} group:{} set:{}",
                puzzle.number(),
                session.group_name,
                session.set_id
            );
        }
        self.stage = self.stage.advance();
    }

    fn close_session(&mut self) {
        self.sessions.clear();
        self.session = None;
        self.stage = Stage::NotStarted;
        self.completed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{AdminSettings, AssignmentMode};
    use crate::leaderboard::MemoryLeaderboard;
    use crate::store::MemoryStore;

    fn room_with_set(set_id: SetId) -> (EscapeRoom<MemoryStore>, MemoryStore) {
        let admin = MemoryStore::new();
        let session = MemoryStore::new();
        let room = EscapeRoom::new(admin, session.clone()).with_assigner(SetAssigner::with_seed(1));
        room.admin()
            .save(&AdminSettings {
                mode: AssignmentMode::Manual,
                manual_set_id: set_id,
                ..AdminSettings::default()
            })
            .unwrap();
        (room, session)
    }

    fn group() -> GroupInfo {
        GroupInfo::new("Team Argon", 3, "B2")
    }

    #[test]
    fn test_new_room_has_no_session() {
        let (room, _) = room_with_set(SetId::A);
        assert_eq!(room.stage(), Stage::NotStarted);
        assert_eq!(room.set_id(), None);
        assert_eq!(room.elapsed_seconds(10_000), 0);
    }

    #[test]
    fn test_validation_needs_a_set() {
        let (mut room, _) = room_with_set(SetId::A);
        assert!(!room.submit_code(Puzzle::ReactionLogic, "1114"));
    }

    #[test]
    fn test_only_active_puzzle_accepts_codes() {
        let (mut room, _) = room_with_set(SetId::A);
        room.begin(&group(), 0);

        assert!(!room.submit_code(Puzzle::PeriodicTable, "1112"));
        assert_eq!(room.stage(), Stage::Puzzle1Active);

        assert!(!room.submit_code(Puzzle::ReactionLogic, "1115"));
        assert_eq!(room.stage(), Stage::Puzzle1Active);

        assert!(room.submit_code(Puzzle::ReactionLogic, "1114"));
        assert_eq!(room.stage(), Stage::Puzzle2Active);
    }

    #[test]
    fn test_progress_survives_reload() {
        let (mut room, session_store) = room_with_set(SetId::B);
        room.begin(&group(), 1_000);
        assert!(room.submit_code(Puzzle::ReactionLogic, "1112"));

        let reloaded = EscapeRoom::new(MemoryStore::new(), session_store);
        assert_eq!(reloaded.stage(), Stage::Puzzle2Active);
        assert_eq!(reloaded.set_id(), Some(SetId::B));
        assert_eq!(reloaded.codes().p1, "1112");
    }

    #[test]
    fn test_progress_is_saved_again_when_stored_copy_is_gone() {
        let (mut room, session_store) = room_with_set(SetId::B);
        room.begin(&group(), 1_000);
        session_store.remove(crate::store::SESSION_KEY).unwrap();

        assert!(room.submit_code(Puzzle::ReactionLogic, "1112"));
        assert_eq!(room.codes().p1, "1112");

        let reloaded = EscapeRoom::new(MemoryStore::new(), session_store);
        assert_eq!(reloaded.stage(), Stage::Puzzle2Active);
        assert_eq!(reloaded.codes().p1, "1112");
    }

    #[test]
    fn test_finish_clears_session_even_when_sink_fails() {
        let (mut room, session_store) = room_with_set(SetId::A);
        room.begin(&group(), 0);
        assert!(room.submit_code(Puzzle::ReactionLogic, "1114"));
        assert!(room.submit_code(Puzzle::PeriodicTable, "1112"));
        assert!(room.submit_code(Puzzle::ReactionConditions, "341"));
        assert!(room.submit_final("11141112341", 125_000));

        let sink = MemoryLeaderboard::new();
        sink.set_available(false);
        let entry = room.finish(&sink, 200_000).unwrap();

        assert_eq!(entry.seconds, 125);
        assert_eq!(entry.time, "2:05");
        assert_eq!(entry.set_id, Some(SetId::A));
        assert_eq!(room.stage(), Stage::NotStarted);
        assert!(session_store.get(crate::store::SESSION_KEY).is_none());
    }

    #[test]
    fn test_finish_requires_completion() {
        let (mut room, _) = room_with_set(SetId::A);
        room.begin(&group(), 0);
        let sink = MemoryLeaderboard::new();
        assert!(room.finish(&sink, 1_000).is_none());
        assert_eq!(sink.count(), 0);
        assert_eq!(room.stage(), Stage::Puzzle1Active);
    }

    #[test]
    fn test_admin_actions_need_pin() {
        let (mut room, _) = room_with_set(SetId::A);
        room.begin(&group(), 0);
        let sink = MemoryLeaderboard::new();

        assert!(!room.reset_session());
        assert!(!room.clear_leaderboard(&sink));
        assert_eq!(room.stage(), Stage::Puzzle1Active);

        assert!(room.admin().unlock(crate::admin::DEFAULT_ADMIN_PIN));
        assert!(room.clear_leaderboard(&sink));
        assert!(room.reset_session());
        assert_eq!(room.stage(), Stage::NotStarted);
    }
}
