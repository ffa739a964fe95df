//! Set assignment policy
//!
//! Decides which variant a new group receives. Manual mode hands out the
//! configured set; random mode draws uniformly, optionally skipping the set
//! the previous group got so neighbouring groups see different content.

use crate::admin::{AdminSettings, AssignmentMode};
use crate::catalog::SetId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks sets for new groups
#[derive(Debug, Clone)]
pub struct SetAssigner {
    rng: StdRng,
}

impl Default for SetAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl SetAssigner {
    /// Create an assigner seeded from the platform's entropy source
    /// (`crypto.getRandomValues` in the browser)
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create an assigner with a fixed seed for reproducible draws
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose the set for a group whose countdown just finished.
    ///
    /// Always records the choice as `last_assigned_set_id`, manual mode
    /// included, so a later switch to random + exclude-last behaves.
    pub fn assign(&mut self, settings: &mut AdminSettings) -> SetId {
        let set_id = match settings.mode {
            AssignmentMode::Manual => settings.manual_set_id,
            AssignmentMode::Random => {
                let pool: Vec<SetId> = match settings.last_assigned_set_id {
                    Some(last) if settings.exclude_last_in_random => {
                        SetId::ALL.into_iter().filter(|&s| s != last).collect()
                    }
                    _ => SetId::ALL.to_vec(),
                };
                pool[self.rng.gen_range(0..pool.len())]
            }
        };

        settings.last_assigned_set_id = Some(set_id);
        set_id
    }
}

/// Advance the manual set A -> B -> C -> D -> A.
///
/// Leaves `last_assigned_set_id` alone.
pub fn rotate_manual_set(settings: &mut AdminSettings) -> SetId {
    settings.manual_set_id = settings.manual_set_id.next();
    settings.manual_set_id
}
