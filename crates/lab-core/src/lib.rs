//! Stabilize the Lab core
//!
//! Puzzle set assignment and answer validation for a timed chemistry
//! escape room. Groups get one of four content variants, solve three
//! puzzles and combine the codes into a master unlock string.
//!
//! Answers are checked where this crate runs. On the web that is the
//! player's browser, so expected codes are readable by anyone who looks.

pub mod admin;
pub mod assign;
pub mod catalog;
pub mod leaderboard;
pub mod room;
pub mod session;
pub mod store;
pub mod validate;

pub use admin::{AdminPanel, AdminSettings, AdminStore, AssignmentMode, DEFAULT_ADMIN_PIN};
pub use assign::{rotate_manual_set, SetAssigner};
pub use catalog::{
    get_final_code, get_set, Condition, Element, ElementCategory, Equation, Puzzle, PuzzleSet,
    ReactionKind, ReactionType, SetId,
};
pub use leaderboard::{
    format_elapsed, LeaderboardBackend, LeaderboardEntry, LeaderboardError, LeaderboardResult,
    MemoryLeaderboard, StoreLeaderboard,
};
pub use room::EscapeRoom;
pub use session::{GroupInfo, SessionData, SessionStore, SetupError, Stage};
pub use store::{KeyValueStore, MemoryStore, StoreError};
pub use validate::{check_matches, is_correct, is_final_correct, PuzzleCodes};
