//! Action cooldowns.
//!
//! Photo feeding uses a dynamic cooldown that grows with how much the last
//! meal moved the stats: a bland offering lets the player try again almost
//! immediately, a feast (or a disaster) makes them wait. Pet and snack use
//! fixed cooldowns. All three share [`CooldownGate`].

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use khulark_types::Decision;
use serde::Deserialize;

/// Bounds of the dynamic feed cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CooldownConfig {
    /// Cooldown after a decision with no net effect.
    #[serde(default = "default_min_ms")]
    pub min_ms: u64,
    /// Cooldown after a decision whose net effect reaches `magnitude_scale`.
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
    /// Absolute total change at which the cooldown saturates.
    #[serde(default = "default_magnitude_scale")]
    pub magnitude_scale: f64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            min_ms: default_min_ms(),
            max_ms: default_max_ms(),
            magnitude_scale: default_magnitude_scale(),
        }
    }
}

const fn default_min_ms() -> u64 {
    1_000
}

const fn default_max_ms() -> u64 {
    10_000
}

const fn default_magnitude_scale() -> f64 {
    30.0
}

/// Cooldown that follows a feeding decision.
///
/// `t = clamp(|hunger + affection + sanity| / magnitude_scale, 0, 1)` and the
/// cooldown is `min_ms + (max_ms - min_ms) * t`, so it is monotonically
/// non-decreasing in the magnitude of the total change.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)] // millisecond cooldowns are far below 2^52 and the product is non-negative
pub fn feed_cooldown(decision: &Decision, config: &CooldownConfig) -> Duration {
    let min = config.min_ms.min(config.max_ms);
    let max = config.min_ms.max(config.max_ms);

    let magnitude = decision.total_change().abs();
    let t = if config.magnitude_scale > 0.0 && magnitude.is_finite() {
        (magnitude / config.magnitude_scale).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let span = max.saturating_sub(min) as f64;
    let ms = min.saturating_add((span * t).round() as u64);
    Duration::from_millis(ms)
}

/// Returned by [`CooldownGate::check`] while the gate is still closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("too soon, {remaining_secs}s remaining")]
pub struct TooSoon {
    /// Whole seconds until the gate opens, rounded up, at least 1.
    pub remaining_secs: u64,
}

/// Tracks when an action may next be performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownGate {
    ready_at: Option<DateTime<Utc>>,
}

impl CooldownGate {
    /// A gate that is open.
    pub const fn new() -> Self {
        Self { ready_at: None }
    }

    /// Succeeds if the action may be performed at `now`.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), TooSoon> {
        match self.remaining(now) {
            Some(left) => {
                let ms = u64::try_from(left.num_milliseconds()).unwrap_or(0);
                Err(TooSoon {
                    remaining_secs: ms.div_ceil(1000).max(1),
                })
            }
            None => Ok(()),
        }
    }

    /// Close the gate for `cooldown` starting at `now`.
    pub fn start(&mut self, now: DateTime<Utc>, cooldown: Duration) {
        let delta = i64::try_from(cooldown.as_millis())
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX);
        self.ready_at = Some(now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC));
    }

    /// Time left before the gate opens, or `None` if it is open.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        let ready_at = self.ready_at?;
        (now < ready_at).then(|| ready_at.signed_duration_since(now))
    }

    /// Open the gate immediately.
    pub const fn clear(&mut self) {
        self.ready_at = None;
    }
}
