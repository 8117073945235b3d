//! XP, level and pet progression.
//!
//! Every XP change in the crate goes through [`apply_xp_delta`]; storage
//! backends never do their own arithmetic.

use serde::Serialize;
use tracing::{debug, info};

use crate::models::pet::PetCatalog;
use crate::models::task::Difficulty;
use crate::models::user::User;

/// Fixed reward table shared by every call site.
pub fn xp_for_difficulty(difficulty: &Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 5,
        Difficulty::Medium => 10,
        Difficulty::Hard => 15,
        Difficulty::Unrecognized(_) => 0,
    }
}

/// Next threshold: `floor(threshold * 1.2)`, computed in integers.
pub fn next_threshold(threshold: i64) -> i64 {
    threshold.saturating_mul(6) / 5
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionOutcome {
    pub user: User,
    /// Delta actually added before rollover; differs from the request only
    /// when the zero floor clamps it.
    pub xp_applied: i64,
    pub leveled_up: bool,
    pub levels_gained: u32,
    /// Set when the pet style changed as a result of this update.
    pub pet_evolved: bool,
    pub previous_pet_style: String,
}

/// Applies a signed XP delta with zero floor and multi-level rollover.
///
/// The caller decides whether a delta applies at all; this function has no
/// idempotence check.
pub fn apply_xp_delta(user: &User, delta: i64, pets: &PetCatalog) -> ProgressionOutcome {
    let mut next = user.clone();
    let previous_pet_style = user.pet_style.clone();

    next.xp = next.xp.saturating_add(delta).max(0);
    let xp_applied = next.xp - user.xp;
    // A zero threshold would never terminate the rollover loop.
    next.xp_to_next_level = next.xp_to_next_level.max(1);

    let mut levels_gained: u32 = 0;
    while next.xp >= next.xp_to_next_level {
        next.level += 1;
        next.xp -= next.xp_to_next_level;
        next.xp_to_next_level = next_threshold(next.xp_to_next_level).max(1);
        levels_gained += 1;
    }

    next.pet_style = pets.style_for_level(next.level);
    let pet_evolved = next.pet_style != previous_pet_style;

    debug!(
        target: "app::progression",
        delta,
        xp = next.xp,
        level = next.level,
        xp_to_next_level = next.xp_to_next_level,
        "xp delta applied"
    );
    if levels_gained > 0 {
        info!(
            target: "app::progression",
            level = next.level,
            levels_gained,
            pet_style = %next.pet_style,
            pet_evolved,
            "level up"
        );
    }

    ProgressionOutcome {
        user: next,
        xp_applied,
        leveled_up: levels_gained > 0,
        levels_gained,
        pet_evolved,
        previous_pet_style,
    }
}
