//! A group plays the whole room through the public API

use lab_core::{
    get_set, AdminSettings, AssignmentMode, EscapeRoom, GroupInfo, LeaderboardBackend,
    MemoryStore, Puzzle, ReactionKind, SetAssigner, SetId, Stage, StoreLeaderboard,
};
use std::collections::HashMap;

fn manual_room(set_id: SetId, session_store: MemoryStore) -> EscapeRoom<MemoryStore> {
    let room = EscapeRoom::new(MemoryStore::new(), session_store);
    room.admin()
        .save(&AdminSettings {
            mode: AssignmentMode::Manual,
            manual_set_id: set_id,
            ..AdminSettings::default()
        })
        .unwrap();
    room
}

fn board(pairs: &[(ReactionKind, &str)]) -> HashMap<ReactionKind, String> {
    pairs.iter().map(|(k, c)| (*k, c.to_string())).collect()
}

#[test]
fn set_a_scenario_unlocks() {
    let sessions = MemoryStore::new();
    let mut room = manual_room(SetId::A, sessions.clone());
    let group = GroupInfo::new("Team Argon", 3, "B2").validate().unwrap();

    assert_eq!(room.begin(&group, 1_000), SetId::A);
    assert_eq!(room.stage(), Stage::Puzzle1Active);

    assert!(room.submit_code(Puzzle::ReactionLogic, "1114"));
    assert!(room.submit_code(Puzzle::PeriodicTable, "1112"));

    let earned = room.submit_matches(&board(&[
        (ReactionKind::Combustion, "heat"),
        (ReactionKind::AcidBase, "aq"),
        (ReactionKind::SingleReplacement, "gas"),
        (ReactionKind::Decomposition, "elec"),
    ]));
    assert_eq!(earned.as_deref(), Some("341"));
    assert_eq!(room.stage(), Stage::FinalActive);

    assert!(!room.submit_final("11141112342", 300_000));
    assert!(room.submit_final("11141112341", 301_000));
    assert_eq!(room.stage(), Stage::Completed);
    assert_eq!(room.elapsed_seconds(999_000), 300);

    let leaderboard = StoreLeaderboard::new(MemoryStore::new());
    let entry = room.finish(&leaderboard, 400_000).unwrap();
    assert_eq!(entry.group, "Team Argon");
    assert_eq!(entry.time, "5:00");

    let listed = leaderboard.list().unwrap();
    assert_eq!(listed, vec![entry]);
    assert!(sessions.is_empty());
}

#[test]
fn every_set_can_be_completed_with_its_declared_codes() {
    for id in SetId::ALL {
        let mut room = manual_room(id, MemoryStore::new());
        room.begin(&GroupInfo::new("G", 2, ""), 0);
        let set = get_set(id);

        for puzzle in Puzzle::ALL {
            assert!(room.submit_code(puzzle, set.expected_code(puzzle)), "set {}", id);
        }
        assert!(room.submit_final(&lab_core::get_final_code(id), 60_000), "set {}", id);
    }
}

#[test]
fn wrong_board_does_not_advance() {
    let mut room = manual_room(SetId::B, MemoryStore::new());
    room.begin(&GroupInfo::new("G", 2, ""), 0);
    assert!(room.submit_code(Puzzle::ReactionLogic, "1112"));
    assert!(room.submit_code(Puzzle::PeriodicTable, "1920"));

    let wrong = board(&[
        (ReactionKind::Combustion, "energy"),
        (ReactionKind::AcidBase, "saltwater"),
        (ReactionKind::SingleReplacement, "hydrogen"),
        (ReactionKind::Decomposition, "oxygen"),
    ]);
    assert_eq!(room.submit_matches(&wrong), None);
    assert_eq!(room.stage(), Stage::Puzzle3Active);
}

#[test]
fn random_exclude_last_alternates_between_groups() {
    let room_admin = MemoryStore::new();
    let mut room = EscapeRoom::new(room_admin, MemoryStore::new())
        .with_assigner(SetAssigner::with_seed(2024));
    room.admin()
        .save(&AdminSettings {
            mode: AssignmentMode::Random,
            exclude_last_in_random: true,
            ..AdminSettings::default()
        })
        .unwrap();

    let mut previous = room.begin(&GroupInfo::new("First", 2, ""), 0);
    for i in 0..50 {
        let next = room.begin(&GroupInfo::new(format!("G{}", i), 2, ""), 0);
        assert_ne!(next, previous);
        previous = next;
    }
}
