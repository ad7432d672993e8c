//! The creature's three bounded stats and the tags derived from them.
//!
//! Every stat lives in `[STAT_MIN, STAT_MAX]`. The clamp is applied at
//! every mutation by [`Stats::adjust`] and [`Stats::clamped`], so a value
//! outside that range is never observable through this type's API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lowest value any stat can hold.
pub const STAT_MIN: f64 = 0.0;

/// Highest value any stat can hold.
pub const STAT_MAX: f64 = 100.0;

/// Clamp a raw stat value into `[STAT_MIN, STAT_MAX]`.
///
/// `NaN` collapses to `STAT_MIN`.
pub fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

// ---------------------------------------------------------------------------
// Stat names
// ---------------------------------------------------------------------------

/// One of the three creature stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatName {
    /// Physical nourishment.
    Hunger,
    /// Emotional connection with the companion.
    Affection,
    /// How safe, grounded, and emotionally okay the creature feels.
    Sanity,
}

impl StatName {
    /// All stats in display order.
    pub const ALL: [Self; 3] = [Self::Hunger, Self::Affection, Self::Sanity];

    /// The persisted field name of this stat.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hunger => "hunger",
            Self::Affection => "affection",
            Self::Sanity => "sanity",
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stat name is not one of `hunger`, `affection`, `sanity`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stat: {0}")]
pub struct UnknownStat(pub String);

impl FromStr for StatName {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hunger" => Ok(Self::Hunger),
            "affection" => Ok(Self::Affection),
            "sanity" => Ok(Self::Sanity),
            other => Err(UnknownStat(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// The creature's three stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Physical nourishment, 0--100.
    pub hunger: f64,
    /// Emotional connection, 0--100.
    pub affection: f64,
    /// Mental well-being, 0--100.
    pub sanity: f64,
}

impl Stats {
    /// Build a stat block, clamping every value into range.
    pub fn new(hunger: f64, affection: f64, sanity: f64) -> Self {
        Self {
            hunger: clamp_stat(hunger),
            affection: clamp_stat(affection),
            sanity: clamp_stat(sanity),
        }
    }

    /// Read a single stat.
    pub const fn get(&self, stat: StatName) -> f64 {
        match stat {
            StatName::Hunger => self.hunger,
            StatName::Affection => self.affection,
            StatName::Sanity => self.sanity,
        }
    }

    /// Overwrite one stat, clamping into range.
    pub fn set(&mut self, stat: StatName, value: f64) {
        *self.slot_mut(stat) = clamp_stat(value);
    }

    const fn slot_mut(&mut self, stat: StatName) -> &mut f64 {
        match stat {
            StatName::Hunger => &mut self.hunger,
            StatName::Affection => &mut self.affection,
            StatName::Sanity => &mut self.sanity,
        }
    }

    /// Add a signed amount to one stat and clamp the result.
    ///
    /// Returns the `(old, new)` pair.
    pub fn adjust(&mut self, stat: StatName, amount: f64) -> (f64, f64) {
        let slot = self.slot_mut(stat);
        let old = *slot;
        let delta = if amount.is_finite() { amount } else { 0.0 };
        *slot = clamp_stat(old + delta);
        (old, *slot)
    }

    /// Return a copy with every stat clamped into range.
    pub fn clamped(self) -> Self {
        Self::new(self.hunger, self.affection, self.sanity)
    }

    /// Arithmetic mean of the three stats.
    pub fn average(&self) -> f64 {
        (self.hunger + self.affection + self.sanity) / 3.0
    }
}

// ---------------------------------------------------------------------------
// Derived tags
// ---------------------------------------------------------------------------

/// Discrete body shape derived from hunger alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyState {
    /// Hunger below 20.
    Starving,
    /// Hunger in `[20, 40)`.
    Hungry,
    /// Hunger in `[40, 60)`.
    Normal,
    /// Hunger in `[60, 90)`.
    Fed,
    /// Hunger of 90 or more.
    Superfull,
}

impl BodyState {
    /// The persisted tag for this body state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starving => "starving",
            Self::Hungry => "hungry",
            Self::Normal => "normal",
            Self::Fed => "fed",
            Self::Superfull => "superfull",
        }
    }
}

impl fmt::Display for BodyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall mood derived from the average of all three stats.
///
/// Selects idle presentation behavior and warning triggers only; it never
/// feeds back into the stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodCategory {
    /// Average of 70 or more.
    Content,
    /// Average in `[40, 70)`.
    Neutral,
    /// Average in `[20, 40)`.
    Distressed,
    /// Average below 20.
    Critical,
}

impl fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Content => "content",
            Self::Neutral => "neutral",
            Self::Distressed => "distressed",
            Self::Critical => "critical",
        })
    }
}
