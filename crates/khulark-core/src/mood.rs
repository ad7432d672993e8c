//! Mood policy: pure functions from stats to presentation tags.
//!
//! Nothing here mutates state. The store records the body state it last
//! derived; everything else is recomputed on demand by the presenter.

use khulark_types::{BodyState, MoodCategory, Stats};

/// Map hunger to a body state. Each band includes its lower bound.
pub fn body_state(hunger: f64) -> BodyState {
    if hunger >= 90.0 {
        BodyState::Superfull
    } else if hunger >= 60.0 {
        BodyState::Fed
    } else if hunger >= 40.0 {
        BodyState::Normal
    } else if hunger >= 20.0 {
        BodyState::Hungry
    } else {
        BodyState::Starving
    }
}

/// Map the average of all three stats to a mood category.
pub fn mood_category(hunger: f64, affection: f64, sanity: f64) -> MoodCategory {
    let average = Stats {
        hunger,
        affection,
        sanity,
    }
    .average();

    if average >= 70.0 {
        MoodCategory::Content
    } else if average >= 40.0 {
        MoodCategory::Neutral
    } else if average >= 20.0 {
        MoodCategory::Distressed
    } else {
        MoodCategory::Critical
    }
}

/// Background tint behind the creature sprite.
pub const fn background_color(state: BodyState) -> &'static str {
    match state {
        BodyState::Superfull => "#FDF3ED",
        BodyState::Fed => "#F8F1E9",
        BodyState::Normal => "#F4ECDC",
        BodyState::Hungry => "#F6EFE8",
        BodyState::Starving => "#F8F0EA",
    }
}

/// Sprite asset key for a body state.
pub const fn sprite_key(state: BodyState) -> &'static str {
    match state {
        BodyState::Superfull => "khulark-superfull",
        BodyState::Fed => "khulark-fed",
        BodyState::Normal => "khulark-base",
        BodyState::Hungry => "khulark-hungry",
        BodyState::Starving => "khulark-starving",
    }
}
