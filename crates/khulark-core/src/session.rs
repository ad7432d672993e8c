//! The game session: the one place renderers talk to.
//!
//! [`GameSession`] owns the [`StatStore`], the [`FeedingArbiter`] and the
//! three cooldown gates. Every action goes through it, so body state is
//! re-derived after every stat change and observers see each change on the
//! broadcast channel returned by [`GameSession::subscribe`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use khulark_types::{BodyState, Decision, MoodCategory, StatName, Stats};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::GameConfig;
use crate::cooldown::{CooldownGate, feed_cooldown};
use crate::error::FeedError;
use crate::feeding::{FeedingArbiter, ReactionCue, Verdict};
use crate::mood;
use crate::storage::SaveStorage;
use crate::store::{StatChange, StatStore};

/// Capacity of the session event channel.
///
/// A subscriber that falls further behind skips to the newest event.
const EVENT_CAPACITY: usize = 64;

/// Something the player can do to the creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Offer a photo.
    Feed,
    /// Pet the creature.
    Pet,
    /// Hand over a snack.
    Snack,
}

impl Action {
    /// Text shown when the action is attempted during its cooldown.
    pub const fn rejection_text(self) -> &'static str {
        match self {
            Self::Feed | Self::Snack => "Too soon! Wait a bit...",
            Self::Pet => "Give them space...",
        }
    }
}

/// An action attempted before its cooldown elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The refused action.
    pub action: Action,
    /// Whole seconds until it is allowed again, at least 1.
    pub remaining_secs: u64,
    /// Text for the player.
    pub message: &'static str,
}

/// What a photo feeding did.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    /// The decision shown to the player.
    pub decision: Decision,
    /// `true` when the request failed and `decision` is the client fallback.
    /// Fallback deltas are presented but not applied.
    pub fallback: bool,
    /// Stat changes applied to the store.
    pub changes: Vec<StatChange>,
    /// Sound cue for the presenter.
    pub cue: ReactionCue,
    /// How long until the next photo is accepted.
    pub cooldown: Duration,
}

/// Result of [`GameSession::feed_photo`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    /// The photo was judged.
    Reacted(Reaction),
    /// The feed cooldown had not elapsed; nothing was sent.
    Rejected(Rejection),
}

/// Result of [`GameSession::pet`] and [`GameSession::snack`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action was applied.
    Applied(StatChange),
    /// The action's cooldown had not elapsed.
    Rejected(Rejection),
}

/// Broadcast to session subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A stat moved.
    StatChanged(StatChange),
    /// Body state crossed a band boundary.
    BodyStateChanged {
        /// Previous body state.
        old: BodyState,
        /// Current body state.
        new: BodyState,
    },
    /// A photo feeding produced a reaction.
    Reacted {
        /// The decision shown to the player.
        decision: Decision,
        /// Whether it was the client fallback.
        fallback: bool,
        /// Sound cue.
        cue: ReactionCue,
    },
    /// An action was refused by its cooldown.
    Rejected(Rejection),
    /// The creature was reset to defaults.
    Reset,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Current stats.
    pub stats: Stats,
    /// Current body state.
    pub body_state: BodyState,
    /// Current mood.
    pub mood: MoodCategory,
    /// Background color for the body state.
    pub background_color: &'static str,
    /// Sprite key for the body state.
    pub sprite_key: &'static str,
    /// Whether sound effects play.
    pub sound_enabled: bool,
}

/// One player's game.
pub struct GameSession {
    store: StatStore,
    arbiter: FeedingArbiter,
    clock: Arc<dyn Clock>,
    config: GameConfig,
    feed_gate: CooldownGate,
    pet_gate: CooldownGate,
    snack_gate: CooldownGate,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("store", &self.store)
            .field("arbiter", &self.arbiter)
            .field("feed_gate", &self.feed_gate)
            .field("pet_gate", &self.pet_gate)
            .field("snack_gate", &self.snack_gate)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Load the saved creature and connect to the configured feed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Request`] if the HTTP client cannot be built.
    pub fn open(
        config: GameConfig,
        storage: Box<dyn SaveStorage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FeedError> {
        let arbiter = FeedingArbiter::new(
            config.feed.endpoint.clone(),
            Duration::from_millis(config.feed.request_timeout_ms),
        )?;
        Ok(Self::with_arbiter(config, storage, clock, arbiter))
    }

    /// Load the saved creature and use `arbiter` for photo feeding.
    pub fn with_arbiter(
        config: GameConfig,
        storage: Box<dyn SaveStorage>,
        clock: Arc<dyn Clock>,
        arbiter: FeedingArbiter,
    ) -> Self {
        let store = StatStore::load(storage, Arc::clone(&clock), config.decay);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut session = Self {
            store,
            arbiter,
            clock,
            config,
            feed_gate: CooldownGate::new(),
            pet_gate: CooldownGate::new(),
            snack_gate: CooldownGate::new(),
            events,
        };
        session.refresh_body_state();
        info!(
            origin = ?session.store.origin(),
            body_state = %session.store.body_state(),
            "session opened"
        );
        session
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current stats.
    pub fn stats(&self) -> Stats {
        self.store.stats()
    }

    /// Current body state.
    pub fn body_state(&self) -> BodyState {
        self.store.body_state()
    }

    /// Current mood.
    pub fn mood(&self) -> MoodCategory {
        let stats = self.store.stats();
        mood::mood_category(stats.hunger, stats.affection, stats.sanity)
    }

    /// Presentation state for a renderer.
    pub fn snapshot(&self) -> Snapshot {
        let body_state = self.body_state();
        Snapshot {
            stats: self.stats(),
            body_state,
            mood: self.mood(),
            background_color: mood::background_color(body_state),
            sprite_key: mood::sprite_key(body_state),
            sound_enabled: self.store.document().player.settings.sound_enabled,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &StatStore {
        &self.store
    }

    /// Apply decay up to `now`, persist, and refresh body state.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Stats {
        let stats = self.store.tick(now);
        self.refresh_body_state();
        stats
    }

    /// Offer a photo to the creature.
    ///
    /// Rejected without contacting the endpoint while the feed cooldown is
    /// running. Otherwise the photo is judged; on success the decision's
    /// non-zero deltas are applied, and either way the dynamic cooldown
    /// starts from the returned decision.
    pub async fn feed_photo(&mut self, photo: Vec<u8>) -> FeedOutcome {
        if let Err(rejection) = self.gate_check(Action::Feed) {
            return FeedOutcome::Rejected(rejection);
        }

        let verdict = self.arbiter.submit_photo(photo).await;
        let fallback = verdict.is_fallback();
        let decision = match verdict {
            Verdict::Decided(decision) | Verdict::Fallback { decision, .. } => decision,
        };

        let changes = if fallback {
            Vec::new()
        } else {
            self.apply_decision(&decision)
        };

        let cue = ReactionCue::for_decision(&decision);
        let cooldown = feed_cooldown(&decision, &self.config.feed.cooldown);
        self.feed_gate.start(self.clock.now(), cooldown);
        debug!(cooldown_ms = cooldown.as_millis(), fallback, "feed cooldown started");

        self.emit(SessionEvent::Reacted {
            decision: decision.clone(),
            fallback,
            cue,
        });

        FeedOutcome::Reacted(Reaction {
            decision,
            fallback,
            changes,
            cue,
            cooldown,
        })
    }

    /// Pet the creature: fixed affection gain on a fixed cooldown.
    pub fn pet(&mut self) -> ActionOutcome {
        let amount = self.config.actions.pet_affection;
        let cooldown = Duration::from_millis(self.config.actions.pet_cooldown_ms);
        self.fixed_action(Action::Pet, StatName::Affection, amount, cooldown)
    }

    /// Give a snack: fixed hunger gain on a fixed cooldown.
    pub fn snack(&mut self) -> ActionOutcome {
        let amount = self.config.actions.snack_hunger;
        let cooldown = Duration::from_millis(self.config.actions.snack_cooldown_ms);
        self.fixed_action(Action::Snack, StatName::Hunger, amount, cooldown)
    }

    /// Persist the sound preference.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.store.set_sound_enabled(enabled);
    }

    /// Start over with a fresh creature. Cooldowns are cleared.
    pub fn reset(&mut self) {
        self.store.reset();
        self.feed_gate.clear();
        self.pet_gate.clear();
        self.snack_gate.clear();
        self.refresh_body_state();
        self.emit(SessionEvent::Reset);
    }

    fn fixed_action(
        &mut self,
        action: Action,
        stat: StatName,
        amount: f64,
        cooldown: Duration,
    ) -> ActionOutcome {
        if let Err(rejection) = self.gate_check(action) {
            return ActionOutcome::Rejected(rejection);
        }

        let change = self.store.adjust(stat, amount);
        self.emit(SessionEvent::StatChanged(change));
        self.refresh_body_state();

        let now = self.clock.now();
        match action {
            Action::Pet => self.pet_gate.start(now, cooldown),
            Action::Snack => self.snack_gate.start(now, cooldown),
            Action::Feed => self.feed_gate.start(now, cooldown),
        }
        ActionOutcome::Applied(change)
    }

    fn gate_check(&self, action: Action) -> Result<(), Rejection> {
        let gate = match action {
            Action::Feed => &self.feed_gate,
            Action::Pet => &self.pet_gate,
            Action::Snack => &self.snack_gate,
        };
        gate.check(self.clock.now()).map_err(|too_soon| {
            let rejection = Rejection {
                action,
                remaining_secs: too_soon.remaining_secs,
                message: action.rejection_text(),
            };
            debug!(?action, remaining_secs = too_soon.remaining_secs, "action rejected by cooldown");
            self.emit(SessionEvent::Rejected(rejection.clone()));
            rejection
        })
    }

    fn apply_decision(&mut self, decision: &Decision) -> Vec<StatChange> {
        let deltas = [
            (StatName::Hunger, decision.hunger),
            (StatName::Affection, decision.affection),
            (StatName::Sanity, decision.sanity),
        ];
        let mut changes = Vec::with_capacity(deltas.len());
        for (stat, delta) in deltas {
            if delta.abs() < f64::EPSILON {
                continue;
            }
            let change = self.store.adjust(stat, delta);
            self.emit(SessionEvent::StatChanged(change));
            changes.push(change);
        }
        self.refresh_body_state();
        changes
    }

    fn refresh_body_state(&mut self) {
        if let Some((old, new)) = self.store.refresh_body_state() {
            info!(%old, %new, "body state changed");
            self.emit(SessionEvent::BodyStateChanged { old, new });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn session(clock: &ManualClock) -> GameSession {
        let arbiter = FeedingArbiter::with_client(reqwest::Client::new(), "http://127.0.0.1:9/feed-photo");
        GameSession::with_arbiter(
            GameConfig::default(),
            Box::new(MemoryStorage::new()),
            Arc::new(clock.clone()),
            arbiter,
        )
    }

    #[test]
    fn pet_applies_then_rejects_until_cooldown() {
        let clock = ManualClock::new(start());
        let mut session = session(&clock);
        let mut events = session.subscribe();

        let first = session.pet();
        assert!(matches!(first, ActionOutcome::Applied(c) if (c.new - 60.0).abs() < 1e-9));
        assert!(matches!(events.try_recv(), Ok(SessionEvent::StatChanged(_))));

        clock.advance(TimeDelta::seconds(10));
        let second = session.pet();
        assert_eq!(
            second,
            ActionOutcome::Rejected(Rejection {
                action: Action::Pet,
                remaining_secs: 5,
                message: "Give them space...",
            })
        );
        assert!(matches!(events.try_recv(), Ok(SessionEvent::Rejected(_))));

        clock.advance(TimeDelta::seconds(5));
        assert!(matches!(session.pet(), ActionOutcome::Applied(_)));
    }

    #[test]
    fn snack_has_its_own_gate() {
        let clock = ManualClock::new(start());
        let mut session = session(&clock);

        assert!(matches!(session.pet(), ActionOutcome::Applied(_)));
        assert!(matches!(session.snack(), ActionOutcome::Applied(_)));

        clock.advance(TimeDelta::seconds(20));
        let outcome = session.snack();
        assert!(matches!(
            outcome,
            ActionOutcome::Rejected(Rejection {
                action: Action::Snack,
                remaining_secs: 10,
                message: "Too soon! Wait a bit...",
            })
        ));
    }

    #[test]
    fn tick_crossing_a_band_emits_body_state_change() {
        let clock = ManualClock::new(start());
        let mut session = session(&clock);
        assert_eq!(session.body_state(), BodyState::Superfull);
        let mut events = session.subscribe();

        // 100 - 2h * 10/h = 80 -> fed
        let later = start() + TimeDelta::hours(2);
        clock.set(later);
        let stats = session.tick(later);
        assert!((stats.hunger - 80.0).abs() < 1e-9);
        assert_eq!(session.body_state(), BodyState::Fed);
        assert_eq!(
            events.try_recv().ok(),
            Some(SessionEvent::BodyStateChanged {
                old: BodyState::Superfull,
                new: BodyState::Fed,
            })
        );
    }

    #[test]
    fn snapshot_reflects_presentation_tables() {
        let clock = ManualClock::new(start());
        let mut session = session(&clock);
        session.set_sound_enabled(false);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.body_state, BodyState::Superfull);
        assert_eq!(snapshot.sprite_key, mood::sprite_key(BodyState::Superfull));
        assert_eq!(snapshot.background_color, mood::background_color(BodyState::Superfull));
        assert_eq!(snapshot.mood, MoodCategory::Content);
        assert!(!snapshot.sound_enabled);
    }

    #[test]
    fn reset_clears_cooldowns_and_announces() {
        let clock = ManualClock::new(start());
        let mut session = session(&clock);
        assert!(matches!(session.pet(), ActionOutcome::Applied(_)));
        let mut events = session.subscribe();

        session.reset();
        assert_eq!(events.try_recv().ok(), Some(SessionEvent::Reset));
        assert!(matches!(session.pet(), ActionOutcome::Applied(_)));
        assert!((session.stats().affection - 60.0).abs() < 1e-9);
    }
}
