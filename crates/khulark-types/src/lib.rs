//! Shared type definitions for the Khulark virtual pet.
//!
//! This crate is the single source of truth for the values that cross a
//! boundary: the creature's stats as persisted by the game client, and the
//! feeding decision exchanged between the game client and the feed-photo
//! worker.
//!
//! # Modules
//!
//! - [`stats`] -- The three bounded stats and the derived body/mood tags
//! - [`decision`] -- Feeding decisions and untrusted-input coercion
//! - [`detection`] -- Object-detection results returned by the vision model
//! - [`save`] -- The persisted save document

pub mod decision;
pub mod detection;
pub mod save;
pub mod stats;

pub use decision::{
    AFFECTION_DELTA_LIMIT, ALERT_TEXT_MAX_CHARS, Decision, HUNGER_DELTA_LIMIT,
    SANITY_DELTA_LIMIT, SPEECH_MAX_CHARS,
};
pub use detection::{BoundingBox, Detection};
pub use save::{
    CreatureRecord, PlayerRecord, PlayerSettings, SAVE_VERSION, SaveDocument, SaveParseError,
};
pub use stats::{
    BodyState, MoodCategory, STAT_MAX, STAT_MIN, StatName, Stats, UnknownStat, clamp_stat,
};
