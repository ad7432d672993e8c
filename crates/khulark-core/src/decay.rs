//! Time-based stat decay.
//!
//! Decay is computed lazily: whenever the creature is observed (load,
//! `tick`, or any persisting mutation) the store applies decay for the real
//! time elapsed since `lastSeenAt`. Nothing runs between sessions.
//!
//! - Hunger drops by `hunger_per_hour` per elapsed hour (default 10)
//! - Affection drops by `affection_per_hour` (default 5)
//! - Sanity drops by `sanity_per_hour` (default 3)
//!
//! Decay is linear in elapsed time, never increases a stat, never takes a
//! stat below zero, and does nothing for non-positive elapsed time.

use khulark_types::{StatName, Stats};
use serde::Deserialize;

/// Milliseconds in one hour.
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Hourly decay rates for the three stats.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DecayRates {
    /// Hunger lost per hour.
    #[serde(default = "default_hunger_per_hour")]
    pub hunger_per_hour: f64,
    /// Affection lost per hour.
    #[serde(default = "default_affection_per_hour")]
    pub affection_per_hour: f64,
    /// Sanity lost per hour.
    #[serde(default = "default_sanity_per_hour")]
    pub sanity_per_hour: f64,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            hunger_per_hour: default_hunger_per_hour(),
            affection_per_hour: default_affection_per_hour(),
            sanity_per_hour: default_sanity_per_hour(),
        }
    }
}

impl DecayRates {
    /// The hourly rate for one stat. Negative configured rates count as 0.
    pub fn rate(&self, stat: StatName) -> f64 {
        let rate = match stat {
            StatName::Hunger => self.hunger_per_hour,
            StatName::Affection => self.affection_per_hour,
            StatName::Sanity => self.sanity_per_hour,
        };
        rate.max(0.0)
    }
}

const fn default_hunger_per_hour() -> f64 {
    10.0
}

const fn default_affection_per_hour() -> f64 {
    5.0
}

const fn default_sanity_per_hour() -> f64 {
    3.0
}

/// Convert elapsed milliseconds to fractional hours.
#[allow(clippy::cast_precision_loss)] // sub-millisecond precision is irrelevant at hour scale
fn hours(elapsed_ms: i64) -> f64 {
    elapsed_ms as f64 / MS_PER_HOUR
}

/// Apply decay for `elapsed_ms` milliseconds to `stats`.
///
/// Returns `false` (and leaves `stats` untouched) when `elapsed_ms <= 0`.
pub fn apply_decay(stats: &mut Stats, rates: &DecayRates, elapsed_ms: i64) -> bool {
    if elapsed_ms <= 0 {
        return false;
    }
    let hours_elapsed = hours(elapsed_ms);

    for stat in StatName::ALL {
        let loss = rates.rate(stat) * hours_elapsed;
        stats.set(stat, (stats.get(stat) - loss).max(0.0));
    }
    true
}
