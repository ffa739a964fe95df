//! Answer validators
//!
//! Exact string comparison, no normalization. Wrong, empty and partial
//! codes simply fail; they never error.

use crate::catalog::{get_set, Puzzle, ReactionKind, SetId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Does `submitted` equal the code `puzzle` of set `set_id` expects?
pub fn is_correct(set_id: SetId, puzzle: Puzzle, submitted: &str) -> bool {
    submitted == get_set(set_id).expected_code(puzzle)
}

/// Check a Puzzle 3 matching board.
///
/// Every reaction kind must point at its correct condition and nothing
/// else may be on the board. On success returns the code the group earns.
pub fn check_matches(set_id: SetId, matches: &HashMap<ReactionKind, String>) -> Option<String> {
    let set = get_set(set_id);
    if matches.len() != set.correct_matches.len() {
        return None;
    }

    let all_correct = set
        .correct_matches
        .iter()
        .all(|(kind, condition)| matches.get(kind).map(String::as_str) == Some(*condition));

    if all_correct {
        Some(set.expected.p3.to_string())
    } else {
        None
    }
}

/// Codes a group recorded, one per puzzle (empty until earned)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleCodes {
    pub p1: String,
    pub p2: String,
    pub p3: String,
}

impl PuzzleCodes {
    pub fn get(&self, puzzle: Puzzle) -> &str {
        match puzzle {
            Puzzle::ReactionLogic => &self.p1,
            Puzzle::PeriodicTable => &self.p2,
            Puzzle::ReactionConditions => &self.p3,
        }
    }

    pub fn set(&mut self, puzzle: Puzzle, code: impl Into<String>) {
        let slot = match puzzle {
            Puzzle::ReactionLogic => &mut self.p1,
            Puzzle::PeriodicTable => &mut self.p2,
            Puzzle::ReactionConditions => &mut self.p3,
        };
        *slot = code.into();
    }

    /// Master unlock string: p1 ‖ p2 ‖ p3
    pub fn combined(&self) -> String {
        format!("{}{}{}", self.p1, self.p2, self.p3)
    }
}

/// Final-stage check against the group's own recorded codes, never the
/// catalog's reference value.
pub fn is_final_correct(codes: &PuzzleCodes, submitted_final: &str) -> bool {
    submitted_final == codes.combined()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_a_matches() -> HashMap<ReactionKind, String> {
        [
            (ReactionKind::Combustion, "heat"),
            (ReactionKind::AcidBase, "aq"),
            (ReactionKind::SingleReplacement, "gas"),
            (ReactionKind::Decomposition, "elec"),
        ]
        .into_iter()
        .map(|(k, c)| (k, c.to_string()))
        .collect()
    }

    #[test]
    fn test_declared_codes_validate() {
        for id in SetId::ALL {
            let set = get_set(id);
            for puzzle in Puzzle::ALL {
                assert!(is_correct(id, puzzle, set.expected_code(puzzle)), "set {} {:?}", id, puzzle);
            }
        }
    }

    #[test]
    fn test_no_normalization() {
        assert!(is_correct(SetId::A, Puzzle::ReactionLogic, "1114"));
        assert!(!is_correct(SetId::A, Puzzle::ReactionLogic, " 1114"));
        assert!(!is_correct(SetId::A, Puzzle::ReactionLogic, "111"));
        assert!(!is_correct(SetId::A, Puzzle::ReactionLogic, ""));
        assert!(!is_correct(SetId::C, Puzzle::PeriodicTable, "304"));
        assert!(is_correct(SetId::C, Puzzle::PeriodicTable, "0304"));
    }

    #[test]
    fn test_codes_are_set_specific() {
        assert!(is_correct(SetId::B, Puzzle::PeriodicTable, "1920"));
        assert!(!is_correct(SetId::A, Puzzle::PeriodicTable, "1920"));
    }

    #[test]
    fn test_set_a_matching_board() {
        assert_eq!(check_matches(SetId::A, &set_a_matches()).as_deref(), Some("341"));
        assert_eq!(check_matches(SetId::B, &set_a_matches()), None);
    }

    #[test]
    fn test_incomplete_or_swapped_board_fails() {
        let mut partial = set_a_matches();
        partial.remove(&ReactionKind::Decomposition);
        assert_eq!(check_matches(SetId::A, &partial), None);

        let mut swapped = set_a_matches();
        swapped.insert(ReactionKind::Combustion, "elec".to_string());
        swapped.insert(ReactionKind::Decomposition, "heat".to_string());
        assert_eq!(check_matches(SetId::A, &swapped), None);
    }

    #[test]
    fn test_final_code_accepts_exact_concatenation() {
        let codes = PuzzleCodes {
            p1: "1114".to_string(),
            p2: "1112".to_string(),
            p3: "341".to_string(),
        };
        let good = "11141112341";
        assert!(is_final_correct(&codes, good));

        for (i, ch) in good.char_indices() {
            let replacement = if ch == '9' { '0' } else { '9' };
            let mut mutated = good.to_string();
            mutated.replace_range(i..i + 1, &replacement.to_string());
            assert!(!is_final_correct(&codes, &mutated), "mutation at {}", i);
        }
        assert!(!is_final_correct(&codes, &good[..10]));
        assert!(!is_final_correct(&codes, &format!("{}1", good)));
    }

    #[test]
    fn test_final_uses_recorded_codes() {
        let mut codes = PuzzleCodes::default();
        codes.set(Puzzle::ReactionLogic, "1112");
        codes.set(Puzzle::PeriodicTable, "1920");
        codes.set(Puzzle::ReactionConditions, "321");

        assert_eq!(codes.get(Puzzle::PeriodicTable), "1920");
        assert!(is_final_correct(&codes, "11121920321"));
        assert!(!is_final_correct(&codes, &crate::catalog::get_final_code(SetId::A)));
    }

    #[test]
    fn test_empty_codes_only_accept_empty_final() {
        let codes = PuzzleCodes::default();
        assert!(!is_final_correct(&codes, "11141112341"));
        assert!(is_final_correct(&codes, ""));
    }
}
