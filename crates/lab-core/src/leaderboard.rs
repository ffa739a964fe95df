//! Leaderboard entries and backend abstraction
//!
//! The leaderboard is an external sink: a list sorted by elapsed seconds
//! with append and clear-all. Submission is best-effort; a failure is
//! logged and never holds up the run.

use crate::catalog::SetId;
use crate::store::{self, KeyValueStore, LEADERBOARD_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// One finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub group: String,
    /// Elapsed time as `M:SS`
    pub time: String,
    pub seconds: u64,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<SetId>,
}

impl LeaderboardEntry {
    pub fn new(group: &str, seconds: u64, date: &str, set_id: SetId) -> Self {
        Self {
            group: group.to_string(),
            time: format_elapsed(seconds),
            seconds,
            date: date.to_string(),
            set_id: Some(set_id),
        }
    }
}

/// Format seconds as `M:SS`
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Whole seconds between two millisecond timestamps
pub fn elapsed_seconds(started_at_ms: u64, now_ms: u64) -> u64 {
    now_ms.saturating_sub(started_at_ms) / 1000
}

/// UTC calendar date (`YYYY-MM-DD`) of a millisecond timestamp
pub fn date_string(now_ms: u64) -> String {
    i64::try_from(now_ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

/// Result type for leaderboard operations
pub type LeaderboardResult<T> = Result<T, LeaderboardError>;

/// Errors that can occur during leaderboard operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),
    /// Server answered with a non-success status
    #[error("Server error: HTTP {0}")]
    Server(u16),
    /// Entry refused before sending
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Trait for leaderboard backends
pub trait LeaderboardBackend {
    /// All entries, fastest first
    fn list(&self) -> LeaderboardResult<Vec<LeaderboardEntry>>;

    /// Append an entry
    fn submit(&self, entry: LeaderboardEntry) -> LeaderboardResult<()>;

    /// Remove every entry
    fn clear(&self) -> LeaderboardResult<()>;

    /// Backend name for display
    fn backend_name(&self) -> &'static str;
}

fn check_entry(entry: &LeaderboardEntry) -> LeaderboardResult<()> {
    if entry.group.trim().is_empty() {
        return Err(LeaderboardError::InvalidEntry("group name is empty".into()));
    }
    Ok(())
}

/// Insert keeping ascending seconds; ties keep submission order
fn insert_sorted(entries: &mut Vec<LeaderboardEntry>, entry: LeaderboardEntry) {
    let pos = entries
        .iter()
        .position(|e| e.seconds > entry.seconds)
        .unwrap_or(entries.len());
    entries.insert(pos, entry);
}

/// Submit without letting a failure escape.
///
/// Returns whether the sink accepted the entry.
pub fn submit_best_effort(sink: &dyn LeaderboardBackend, entry: LeaderboardEntry) -> bool {
    let group = entry.group.clone();
    match sink.submit(entry) {
        Ok(()) => {
            log::info!("[LEADERBOARD] submitted group:{} backend:{}", group, sink.backend_name());
            true
        }
        Err(e) => {
            log::error!(
                "[LEADERBOARD] submit failed group:{} backend:{} err:{}",
                group,
                sink.backend_name(),
                e
            );
            false
        }
    }
}

// ==================== Key-value backed ====================

/// Sorted list stored as one JSON array under a single key
#[derive(Debug, Clone)]
pub struct StoreLeaderboard<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StoreLeaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> =
            store::load_json(&self.store, LEADERBOARD_KEY).unwrap_or_default();
        entries.sort_by_key(|e| e.seconds);
        entries
    }
}

impl<S: KeyValueStore> LeaderboardBackend for StoreLeaderboard<S> {
    fn list(&self) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        Ok(self.load())
    }

    fn submit(&self, entry: LeaderboardEntry) -> LeaderboardResult<()> {
        check_entry(&entry)?;
        let mut entries = self.load();
        insert_sorted(&mut entries, entry);
        store::save_json(&self.store, LEADERBOARD_KEY, &entries)
            .map_err(|e| LeaderboardError::Storage(e.to_string()))
    }

    fn clear(&self) -> LeaderboardResult<()> {
        self.store
            .remove(LEADERBOARD_KEY)
            .map_err(|e| LeaderboardError::Storage(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "Local"
    }
}

// ==================== Mock Backend for Testing ====================

/// In-memory leaderboard
pub struct MemoryLeaderboard {
    data: Mutex<Vec<LeaderboardEntry>>,
    available: Mutex<bool>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Vec::new()),
            available: Mutex::new(true),
        }
    }

    /// Make every call fail with a network error
    pub fn set_available(&self, available: bool) {
        *self.available.lock().unwrap_or_else(|e| e.into_inner()) = available;
    }

    pub fn count(&self) -> usize {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn ensure_available(&self) -> LeaderboardResult<()> {
        if *self.available.lock().unwrap_or_else(|e| e.into_inner()) {
            Ok(())
        } else {
            Err(LeaderboardError::Network("Mock unavailable".into()))
        }
    }
}

impl Default for MemoryLeaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaderboardBackend for MemoryLeaderboard {
    fn list(&self) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        self.ensure_available()?;
        Ok(self.data.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn submit(&self, entry: LeaderboardEntry) -> LeaderboardResult<()> {
        self.ensure_available()?;
        check_entry(&entry)?;
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        insert_sorted(&mut data, entry);
        Ok(())
    }

    fn clear(&self) -> LeaderboardResult<()> {
        self.ensure_available()?;
        self.data.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn entry(group: &str, seconds: u64) -> LeaderboardEntry {
        LeaderboardEntry::new(group, seconds, "2026-10-19", SetId::A)
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(65), "1:05");
        assert_eq!(format_elapsed(600), "10:00");
        assert_eq!(elapsed_seconds(1_000, 62_999), 61);
        assert_eq!(elapsed_seconds(5_000, 1_000), 0);
    }

    #[test]
    fn test_date_string() {
        assert_eq!(date_string(0), "1970-01-01");
        assert_eq!(date_string(1_760_875_200_000), "2025-10-19");
    }

    #[test]
    fn test_mock_sorted_by_seconds() {
        let board = MemoryLeaderboard::new();
        board.submit(entry("Slow", 900)).unwrap();
        board.submit(entry("Fast", 300)).unwrap();
        board.submit(entry("Tied", 300)).unwrap();

        let groups: Vec<String> = board.list().unwrap().into_iter().map(|e| e.group).collect();
        assert_eq!(groups, vec!["Fast", "Tied", "Slow"]);
    }

    #[test]
    fn test_mock_unavailable() {
        let board = MemoryLeaderboard::new();
        board.set_available(false);
        assert!(board.list().is_err());
        assert!(!submit_best_effort(&board, entry("Team", 10)));
        assert_eq!(board.count(), 0);
    }

    #[test]
    fn test_empty_group_rejected() {
        let board = MemoryLeaderboard::new();
        assert!(matches!(
            board.submit(entry("  ", 10)),
            Err(LeaderboardError::InvalidEntry(_))
        ));
    }

    #[test]
    fn test_store_backend_persists_and_clears() {
        let store = MemoryStore::new();
        let board = StoreLeaderboard::new(store.clone());
        board.submit(entry("B", 200)).unwrap();
        board.submit(entry("A", 100)).unwrap();

        let reopened = StoreLeaderboard::new(store.clone());
        let list = reopened.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].group, "A");
        assert_eq!(list[0].time, "1:40");

        reopened.clear().unwrap();
        assert!(board.list().unwrap().is_empty());
    }

    #[test]
    fn test_store_backend_reads_unsorted_legacy_data() {
        let store = MemoryStore::new();
        store
            .set(
                LEADERBOARD_KEY,
                r#"[{"group":"X","time":"5:00","seconds":300,"date":"2026-01-01"},
                    {"group":"Y","time":"1:00","seconds":60,"date":"2026-01-01","setId":"C"}]"#,
            )
            .unwrap();
        let list = StoreLeaderboard::new(store).list().unwrap();
        assert_eq!(list[0].group, "Y");
        assert_eq!(list[0].set_id, Some(SetId::C));
        assert_eq!(list[1].set_id, None);
    }

    #[test]
    fn test_entry_shape() {
        let json = serde_json::to_value(entry("Team", 125)).unwrap();
        assert_eq!(json["group"], "Team");
        assert_eq!(json["time"], "2:05");
        assert_eq!(json["seconds"], 125);
        assert_eq!(json["date"], "2026-10-19");
        assert_eq!(json["setId"], "A");
    }
}
