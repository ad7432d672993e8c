//! The persisted save document.
//!
//! The document is stored as JSON under a single key:
//!
//! ```json
//! {
//!   "version": 1,
//!   "khulark": {"hunger": 100, "affection": 50, "sanity": 60,
//!               "lastSeenAt": 1700000000000, "bodyState": "superfull"},
//!   "player": {"foodInventory": [], "settings": {"soundEnabled": true}}
//! }
//! ```
//!
//! A document whose `version` differs from [`SAVE_VERSION`] is never
//! migrated; [`SaveDocument::parse`] reports it and the caller starts over.
//! A missing or unrecognized `bodyState` is not an error: it parses as
//! `None` and the owner re-derives it from hunger.

use serde::{Deserialize, Deserializer, Serialize};

use crate::stats::{BodyState, Stats};

/// Schema version written by this build.
pub const SAVE_VERSION: u32 = 1;

/// Errors from [`SaveDocument::parse`].
#[derive(Debug, thiserror::Error)]
pub enum SaveParseError {
    /// The stored document was written by an incompatible schema.
    #[error("save version mismatch: found {found:?}, expected {expected}")]
    VersionMismatch {
        /// The version tag found in storage, if any.
        found: Option<u64>,
        /// The version this build understands.
        expected: u32,
    },

    /// The stored text is not a well-formed save document.
    #[error("malformed save document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Full persisted state: creature plus player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    /// Schema version tag.
    pub version: u32,
    /// The creature's state.
    pub khulark: CreatureRecord,
    /// The player's state.
    #[serde(default)]
    pub player: PlayerRecord,
}

/// Persisted creature state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureRecord {
    /// Hunger, 0--100.
    pub hunger: f64,
    /// Affection, 0--100.
    pub affection: f64,
    /// Sanity, 0--100.
    pub sanity: f64,
    /// Unix epoch milliseconds through which decay has been applied.
    pub last_seen_at: i64,
    /// Body state at the last recompute, if one was stored and understood.
    #[serde(
        default,
        deserialize_with = "lenient_body_state",
        skip_serializing_if = "Option::is_none"
    )]
    pub body_state: Option<BodyState>,
}

/// Unknown body-state tags read as `None` instead of failing the document.
fn lenient_body_state<'de, D>(deserializer: D) -> Result<Option<BodyState>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Persisted player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    /// Reserved for a future food inventory; always empty today.
    #[serde(default)]
    pub food_inventory: Vec<serde_json::Value>,
    /// Player preferences.
    #[serde(default)]
    pub settings: PlayerSettings,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            food_inventory: Vec::new(),
            settings: PlayerSettings::default(),
        }
    }
}

/// Player preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    /// Whether sound effects play.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self { sound_enabled: true }
    }
}

const fn default_true() -> bool {
    true
}

impl SaveDocument {
    /// Build a current-version document for the given creature state.
    pub fn new(stats: Stats, body_state: BodyState, last_seen_at: i64) -> Self {
        Self {
            version: SAVE_VERSION,
            khulark: CreatureRecord {
                hunger: stats.hunger,
                affection: stats.affection,
                sanity: stats.sanity,
                last_seen_at,
                body_state: Some(body_state),
            },
            player: PlayerRecord::default(),
        }
    }

    /// Parse stored JSON, rejecting any schema version but the current one.
    ///
    /// The version is checked before the rest of the document so that an
    /// older layout reports a mismatch rather than a field error.
    pub fn parse(raw: &str) -> Result<Self, SaveParseError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let found = value.get("version").and_then(serde_json::Value::as_u64);
        if found != Some(u64::from(SAVE_VERSION)) {
            return Err(SaveParseError::VersionMismatch {
                found,
                expected: SAVE_VERSION,
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The creature's stats, clamped into range.
    pub fn stats(&self) -> Stats {
        Stats::new(self.khulark.hunger, self.khulark.affection, self.khulark.sanity)
    }

    /// Overwrite the creature's stats.
    pub const fn set_stats(&mut self, stats: Stats) {
        self.khulark.hunger = stats.hunger;
        self.khulark.affection = stats.affection;
        self.khulark.sanity = stats.sanity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveDocument {
        SaveDocument::new(Stats::new(100.0, 50.0, 60.0), BodyState::Superfull, 1_700_000_000_000)
    }

    #[test]
    fn stored_layout_matches_browser_save() {
        let json = sample().to_json().unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value["version"], 1);
        assert_eq!(value["khulark"]["lastSeenAt"], 1_700_000_000_000_i64);
        assert_eq!(value["khulark"]["bodyState"], "superfull");
        assert_eq!(value["player"]["settings"]["soundEnabled"], true);
        assert!(value["player"]["foodInventory"].is_array());
    }

    #[test]
    fn parse_accepts_current_version() {
        let json = sample().to_json().unwrap_or_default();
        let parsed = SaveDocument::parse(&json);
        assert!(parsed.is_ok());
        assert_eq!(parsed.ok(), Some(sample()));
    }

    #[test]
    fn parse_rejects_other_versions() {
        let raw = r#"{"version": 2, "khulark": {}, "player": {}}"#;
        assert!(matches!(
            SaveDocument::parse(raw),
            Err(SaveParseError::VersionMismatch { found: Some(2), .. })
        ));

        let raw = r#"{"khulark": {}}"#;
        assert!(matches!(
            SaveDocument::parse(raw),
            Err(SaveParseError::VersionMismatch { found: None, .. })
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            SaveDocument::parse("{not json"),
            Err(SaveParseError::Malformed(_))
        ));
    }

    #[test]
    fn missing_player_block_defaults() {
        let raw = r#"{"version":1,"khulark":{"hunger":10,"affection":20,"sanity":30,"lastSeenAt":0,"bodyState":"starving"}}"#;
        let parsed = SaveDocument::parse(raw).ok();
        assert!(parsed.is_some_and(|doc| doc.player.settings.sound_enabled));
    }

    #[test]
    fn missing_or_unknown_body_state_parses_as_none() {
        let raw = r#"{"version":1,"khulark":{"hunger":30,"affection":20,"sanity":10,"lastSeenAt":0}}"#;
        let parsed = SaveDocument::parse(raw).ok();
        assert!(parsed.is_some_and(|doc| doc.khulark.body_state.is_none()));

        let raw = r#"{"version":1,"khulark":{"hunger":30,"affection":20,"sanity":10,"lastSeenAt":0,"bodyState":"bloated"}}"#;
        let parsed = SaveDocument::parse(raw).ok();
        assert!(parsed.is_some_and(|doc| {
            (doc.khulark.hunger - 30.0).abs() < f64::EPSILON && doc.khulark.body_state.is_none()
        }));
    }

    #[test]
    fn stats_accessor_clamps() {
        let mut doc = sample();
        doc.khulark.hunger = 180.0;
        doc.khulark.sanity = -4.0;
        let stats = doc.stats();
        assert!((stats.hunger - 100.0).abs() < f64::EPSILON);
        assert!(stats.sanity.abs() < f64::EPSILON);
    }
}
