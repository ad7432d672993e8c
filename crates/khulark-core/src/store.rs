//! Persisted creature state with lazy decay.
//!
//! [`StatStore`] owns the save document. It loads it (falling back to a
//! fresh creature on any problem), applies decay for the time that passed
//! while nobody was looking, and persists after every mutation.
//!
//! `lastSeenAt` always marks the instant through which decay has been
//! applied: every persisting operation first settles decay up to "now" and
//! then stamps "now". The stamp only moves forward, so an earlier "now"
//! (a stale caller instant or a clock stepping back) neither discards
//! decay nor lets the same interval decay twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use khulark_types::{BodyState, SaveDocument, StatName, Stats};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::decay::{DecayRates, apply_decay};
use crate::mood;
use crate::storage::SaveStorage;

/// Hunger of a newly hatched creature.
pub const DEFAULT_HUNGER: f64 = 100.0;

/// Affection of a newly hatched creature.
pub const DEFAULT_AFFECTION: f64 = 50.0;

/// Sanity of a newly hatched creature.
pub const DEFAULT_SANITY: f64 = 60.0;

/// A single stat mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatChange {
    /// Which stat changed.
    pub stat: StatName,
    /// Value before the mutation.
    pub old: f64,
    /// Value after the mutation (already clamped).
    pub new: f64,
}

/// How [`StatStore::load`] obtained its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// A compatible save was found and decayed forward.
    Restored,
    /// Nothing was saved yet.
    Fresh,
    /// A save existed but was unreadable or from another schema version.
    Discarded,
}

/// The creature's persisted state.
pub struct StatStore {
    doc: SaveDocument,
    storage: Box<dyn SaveStorage>,
    clock: Arc<dyn Clock>,
    rates: DecayRates,
    origin: LoadOrigin,
}

impl std::fmt::Debug for StatStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatStore")
            .field("doc", &self.doc)
            .field("rates", &self.rates)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl StatStore {
    /// Load the saved creature, or hatch a new one.
    ///
    /// Any read or parse failure is treated as "no save found". A restored
    /// save is decayed for the time elapsed since `lastSeenAt`, stamped with
    /// the current instant, and persisted before returning. A fresh
    /// creature is persisted too.
    pub fn load(
        storage: Box<dyn SaveStorage>,
        clock: Arc<dyn Clock>,
        rates: DecayRates,
    ) -> Self {
        let now = clock.now();

        let (doc, origin) = match storage.read() {
            Ok(Some(raw)) => match SaveDocument::parse(&raw) {
                Ok(mut doc) => {
                    // A hand-edited save must not break the range invariant.
                    let stats = doc.stats();
                    doc.set_stats(stats);
                    if doc.khulark.body_state.is_none() {
                        debug!("save has no usable body state, deriving it from hunger");
                        doc.khulark.body_state = Some(mood::body_state(stats.hunger));
                    }
                    (doc, LoadOrigin::Restored)
                }
                Err(e) => {
                    warn!(error = %e, "discarding incompatible save, using defaults");
                    (default_document(now), LoadOrigin::Discarded)
                }
            },
            Ok(None) => (default_document(now), LoadOrigin::Fresh),
            Err(e) => {
                warn!(error = %e, "failed to read save, using defaults");
                (default_document(now), LoadOrigin::Discarded)
            }
        };

        let mut store = Self {
            doc,
            storage,
            clock,
            rates,
            origin,
        };

        if origin == LoadOrigin::Restored {
            let elapsed_ms = store.elapsed_ms(now);
            info!(elapsed_ms, "restoring saved creature");
        }
        store.save_at(now);
        store
    }

    /// How the current state was obtained.
    pub const fn origin(&self) -> LoadOrigin {
        self.origin
    }

    /// Current stats.
    pub fn stats(&self) -> Stats {
        self.doc.stats()
    }

    /// The full document as it would be persisted.
    pub const fn document(&self) -> &SaveDocument {
        &self.doc
    }

    /// Instant through which decay has been applied.
    pub fn last_seen_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.doc.khulark.last_seen_at)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Apply decay for `elapsed_ms` to the in-memory stats.
    ///
    /// Does not persist and does not move `lastSeenAt`; callers that want
    /// wall-clock decay use [`StatStore::tick`].
    pub fn apply_decay(&mut self, elapsed_ms: i64) -> bool {
        let mut stats = self.doc.stats();
        let applied = apply_decay(&mut stats, &self.rates, elapsed_ms);
        if applied {
            self.doc.set_stats(stats);
        }
        applied
    }

    /// Apply decay for the time elapsed up to `now` and persist.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Stats {
        self.save_at(now);
        self.stats()
    }

    /// Add a signed amount to a stat by name.
    ///
    /// Returns `None` without touching anything if `name` is not
    /// `hunger`, `affection` or `sanity`.
    pub fn modify_stat(&mut self, name: &str, amount: f64) -> Option<StatChange> {
        match name.parse::<StatName>() {
            Ok(stat) => Some(self.adjust(stat, amount)),
            Err(e) => {
                debug!(error = %e, "ignoring modification of unknown stat");
                None
            }
        }
    }

    /// Add a signed amount to a stat, clamp it into `[0, 100]`, and persist.
    pub fn adjust(&mut self, stat: StatName, amount: f64) -> StatChange {
        let now = self.clock.now();
        self.settle(now);

        let mut stats = self.doc.stats();
        let (old, new) = stats.adjust(stat, amount);
        self.doc.set_stats(stats);
        debug!(%stat, old, new, "stat modified");

        self.save_at(now);
        StatChange { stat, old, new }
    }

    /// The body state recorded at the last recompute.
    pub fn body_state(&self) -> BodyState {
        self.doc
            .khulark
            .body_state
            .unwrap_or_else(|| mood::body_state(self.doc.khulark.hunger))
    }

    /// Record a body state and persist.
    pub fn set_body_state(&mut self, state: BodyState) {
        self.doc.khulark.body_state = Some(state);
        self.save();
    }

    /// Re-derive the body state from hunger.
    ///
    /// Returns the `(old, new)` pair when it changed (and persists), `None`
    /// when it did not.
    pub fn refresh_body_state(&mut self) -> Option<(BodyState, BodyState)> {
        let old = self.body_state();
        let new = mood::body_state(self.doc.khulark.hunger);
        if old == new {
            return None;
        }
        self.set_body_state(new);
        Some((old, new))
    }

    /// Persist the sound preference.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.doc.player.settings.sound_enabled = enabled;
        self.save();
    }

    /// Persist the full state, stamping `lastSeenAt` with the current instant.
    ///
    /// A write failure is logged and swallowed: the in-memory state stays
    /// authoritative for the session. Returns whether the write succeeded.
    pub fn save(&mut self) -> bool {
        let now = self.clock.now();
        self.save_at(now)
    }

    /// Throw the creature away and hatch a new one.
    pub fn reset(&mut self) {
        let now = self.clock.now();
        info!("resetting creature to defaults");
        self.doc = default_document(now);
        self.origin = LoadOrigin::Fresh;
        self.save_at(now);
    }

    fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis()
            .saturating_sub(self.doc.khulark.last_seen_at)
    }

    /// Apply decay up to `now` without persisting.
    fn settle(&mut self, now: DateTime<Utc>) {
        let elapsed_ms = self.elapsed_ms(now);
        if self.apply_decay(elapsed_ms) {
            debug!(elapsed_ms, "decay applied");
        }
    }

    fn save_at(&mut self, now: DateTime<Utc>) -> bool {
        self.settle(now);
        self.doc.khulark.last_seen_at = self.doc.khulark.last_seen_at.max(now.timestamp_millis());

        let result = self
            .doc
            .to_json()
            .map_err(crate::error::StoreError::from)
            .and_then(|json| self.storage.write(&json));

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to persist creature state, keeping in-memory state");
                false
            }
        }
    }
}

/// A freshly hatched creature.
fn default_document(now: DateTime<Utc>) -> SaveDocument {
    let stats = Stats::new(DEFAULT_HUNGER, DEFAULT_AFFECTION, DEFAULT_SANITY);
    SaveDocument::new(stats, mood::body_state(stats.hunger), now.timestamp_millis())
}
