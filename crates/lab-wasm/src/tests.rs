//! Browser tests for the WASM controller

#[cfg(test)]
mod tests {
    use crate::storage::WebStorage;
    use crate::StabilizeLab;
    use lab_core::{
        KeyValueStore, LeaderboardBackend, LeaderboardEntry, SetId, StoreLeaderboard,
        DEFAULT_ADMIN_PIN,
    };
    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn clear_storage() {
        let window = web_sys::window().unwrap();
        window.local_storage().unwrap().unwrap().clear().unwrap();
        window.session_storage().unwrap().unwrap().clear().unwrap();
    }

    /// Fresh lab pinned to set `set_id` through the admin panel
    fn lab_on_set(set_id: &str) -> StabilizeLab {
        clear_storage();
        let lab = StabilizeLab::new(None, None);
        assert!(lab.admin_unlock(DEFAULT_ADMIN_PIN));
        assert!(lab.admin_set_mode("manual"));
        assert!(lab.admin_set_manual_set(set_id));
        lab.admin_logout();
        lab
    }

    /// Nothing listens on the discard port, so every fetch fails
    const DEAD_API: &str = "http://127.0.0.1:9/api";

    fn seed_local_board() {
        let local = StoreLeaderboard::new(WebStorage::local());
        local
            .submit(LeaderboardEntry::new("Team Radon", 95, "2026-10-19", SetId::D))
            .unwrap();
    }

    fn board(pairs: &[(&str, &str)]) -> JsValue {
        let object = js_sys::Object::new();
        for (kind, condition) in pairs {
            js_sys::Reflect::set(&object, &(*kind).into(), &(*condition).into()).unwrap();
        }
        object.into()
    }

    #[wasm_bindgen_test]
    fn test_storage_round_trip() {
        clear_storage();
        let store = WebStorage::session();
        store.set("scratch", "1").unwrap();
        assert_eq!(store.get("scratch").as_deref(), Some("1"));
        store.remove("scratch").unwrap();
        assert_eq!(store.get("scratch"), None);
    }

    #[wasm_bindgen_test]
    fn test_begin_rejects_bad_setup() {
        clear_storage();
        let mut lab = StabilizeLab::new(None, None);
        assert!(lab.check_group("  ", 3, "").is_some());
        assert!(lab.check_group("Team", 11, "").is_some());
        assert!(lab.check_group("Team", 3, "A1").is_none());
        assert!(lab.begin("", 3, "").is_err());
        assert_eq!(lab.stage(), "NotStarted");
    }

    #[wasm_bindgen_test]
    fn test_full_run_in_browser() {
        let mut lab = lab_on_set("C");
        assert_eq!(lab.begin("Team Neon", 4, "C3").unwrap(), "C");
        assert_eq!(lab.set_id().as_deref(), Some("C"));
        assert!(lab.puzzle_set().is_ok());

        assert!(!lab.submit_code(2, "0304"));
        assert!(lab.submit_code(1, "1116"));
        assert!(lab.submit_code(2, "0304"));
        assert_eq!(lab.stage(), "Puzzle3Active");

        let earned = lab.submit_matches(board(&[
            ("comb", "energyrel"),
            ("acid", "neutral"),
            ("single", "bubbles"),
            ("decomp", "simpler"),
        ]));
        assert_eq!(earned.as_deref(), Some("321"));

        assert!(lab.submit_final("11160304321"));
        assert_eq!(lab.stage(), "Completed");

        let entry = lab.submit_to_leaderboard().unwrap();
        assert!(entry.contains("Team Neon"));
        assert_eq!(lab.stage(), "NotStarted");
        assert!(lab.leaderboard_json().contains("Team Neon"));
    }

    #[wasm_bindgen_test]
    fn test_session_survives_new_controller() {
        let mut lab = lab_on_set("B");
        lab.begin("Team Xenon", 2, "").unwrap();
        assert!(lab.submit_code(1, "1112"));

        let reopened = StabilizeLab::new(None, None);
        assert_eq!(reopened.stage(), "Puzzle2Active");
        assert_eq!(reopened.group_name().as_deref(), Some("Team Xenon"));
        assert!(reopened.codes_json().contains("1112"));
    }

    #[wasm_bindgen_test]
    fn test_admin_needs_pin() {
        clear_storage();
        let mut lab = StabilizeLab::new(None, Some("4321".to_string()));
        assert!(!lab.admin_set_mode("manual"));
        assert_eq!(lab.admin_rotate_manual_set(), None);
        assert!(lab.admin_preview_json().is_none());
        assert!(!lab.admin_reset_session());

        assert!(!lab.admin_unlock(DEFAULT_ADMIN_PIN));
        assert!(lab.admin_unlock("4321"));
        assert_eq!(lab.admin_rotate_manual_set().as_deref(), Some("B"));
        assert_eq!(lab.admin_toggle_debug_overlay(), Some(true));
        assert!(lab.debug_overlay());
        assert!(lab.admin_preview_json().unwrap().contains("11141112341"));
        assert!(lab.admin_settings_json().contains("\"manualSetId\":\"B\""));
    }

    #[wasm_bindgen_test]
    fn test_hints_follow_assigned_set() {
        let mut lab = lab_on_set("A");
        assert_eq!(lab.hint(1, 1), None);
        lab.begin("Team", 3, "").unwrap();
        assert!(lab.hint(1, 1).is_some());
        assert!(lab.hint(3, 3).is_some());
        assert_eq!(lab.hint(4, 1), None);
    }

    #[wasm_bindgen_test]
    async fn test_failed_clear_is_reported() {
        clear_storage();
        seed_local_board();
        let lab = StabilizeLab::new(Some(DEAD_API.to_string()), None);

        let locked = JsFuture::from(lab.admin_clear_leaderboard()).await.unwrap();
        assert_eq!(locked.as_bool(), Some(false));

        assert!(lab.admin_unlock(DEFAULT_ADMIN_PIN));
        let cleared = JsFuture::from(lab.admin_clear_leaderboard()).await.unwrap();
        assert_eq!(cleared.as_bool(), Some(false));
        // The mirror stays until the server agrees
        assert!(lab.leaderboard_json().contains("Team Radon"));
    }

    #[wasm_bindgen_test]
    async fn test_refresh_falls_back_to_local_copy() {
        clear_storage();
        seed_local_board();
        let lab = StabilizeLab::new(Some(DEAD_API.to_string()), None);

        let list = JsFuture::from(lab.refresh_leaderboard()).await.unwrap();
        let entries: Vec<LeaderboardEntry> = serde_wasm_bindgen::from_value(list).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].group, "Team Radon");
        assert_eq!(entries[0].time, "1:35");
    }
}
