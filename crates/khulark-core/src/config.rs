//! Game configuration.
//!
//! The canonical configuration lives in `khulark-config.yaml` at the project
//! root. Every field has a default matching the shipped game, so an empty
//! file (or no file at all) yields a playable setup.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cooldown::CooldownConfig;
use crate::decay::DecayRates;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration. Mirrors `khulark-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Photo feeding: endpoint and dynamic cooldown.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Hourly decay rates.
    #[serde(default)]
    pub decay: DecayRates,

    /// Pet and snack amounts and cooldowns.
    #[serde(default)]
    pub actions: ActionsConfig,

    /// Where the save document lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session loop timing.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `FEED_ENDPOINT` overrides `feed.endpoint` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("FEED_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            self.feed.endpoint = endpoint;
        }
    }
}

/// Photo feeding configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedConfig {
    /// Full URL of the feed-photo endpoint.
    #[serde(default = "default_feed_endpoint")]
    pub endpoint: String,

    /// Upper bound on one feed request, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Dynamic cooldown bounds.
    #[serde(default)]
    pub cooldown: CooldownConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_feed_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
            cooldown: CooldownConfig::default(),
        }
    }
}

fn default_feed_endpoint() -> String {
    "http://127.0.0.1:8787/feed-photo".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Fixed-cooldown actions.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ActionsConfig {
    /// Affection gained per pet.
    #[serde(default = "default_pet_affection")]
    pub pet_affection: f64,

    /// Milliseconds between pets.
    #[serde(default = "default_pet_cooldown_ms")]
    pub pet_cooldown_ms: u64,

    /// Hunger gained per snack.
    #[serde(default = "default_snack_hunger")]
    pub snack_hunger: f64,

    /// Milliseconds between snacks.
    #[serde(default = "default_snack_cooldown_ms")]
    pub snack_cooldown_ms: u64,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            pet_affection: default_pet_affection(),
            pet_cooldown_ms: default_pet_cooldown_ms(),
            snack_hunger: default_snack_hunger(),
            snack_cooldown_ms: default_snack_cooldown_ms(),
        }
    }
}

const fn default_pet_affection() -> f64 {
    10.0
}

const fn default_pet_cooldown_ms() -> u64 {
    15_000
}

const fn default_snack_hunger() -> f64 {
    20.0
}

const fn default_snack_cooldown_ms() -> u64 {
    30_000
}

/// Save location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the save file.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Storage key; the file is `<save_dir>/<key>.json`.
    #[serde(default = "default_save_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            key: default_save_key(),
        }
    }
}

fn default_save_dir() -> PathBuf {
    PathBuf::from(".khulark")
}

fn default_save_key() -> String {
    "khulark-save".to_owned()
}

/// Session loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Milliseconds between decay ticks while a session is open.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    60_000
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_shipped_game() {
        let config = GameConfig::default();
        assert!((config.decay.hunger_per_hour - 10.0).abs() < f64::EPSILON);
        assert!((config.decay.affection_per_hour - 5.0).abs() < f64::EPSILON);
        assert!((config.decay.sanity_per_hour - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.feed.cooldown.min_ms, 1_000);
        assert_eq!(config.feed.cooldown.max_ms, 10_000);
        assert_eq!(config.actions.pet_cooldown_ms, 15_000);
        assert_eq!(config.actions.snack_cooldown_ms, 30_000);
        assert_eq!(config.storage.key, "khulark-save");
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let yaml = r"
feed:
  endpoint: http://pet.example/feed-photo
  cooldown:
    max_ms: 20000
decay:
  hunger_per_hour: 2.5
storage:
  save_dir: /tmp/khulark
";
        let config = GameConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert_eq!(config.feed.endpoint, "http://pet.example/feed-photo");
        assert_eq!(config.feed.cooldown.min_ms, 1_000);
        assert_eq!(config.feed.cooldown.max_ms, 20_000);
        assert!((config.decay.hunger_per_hour - 2.5).abs() < f64::EPSILON);
        assert!((config.decay.sanity_per_hour - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.storage.save_dir, PathBuf::from("/tmp/khulark"));
        assert_eq!(config.storage.key, "khulark-save");
    }

    #[test]
    fn shipped_config_file_is_the_default() {
        let shipped = GameConfig::parse(include_str!("../../../khulark-config.yaml"));
        assert_eq!(shipped.ok(), Some(GameConfig::default()));
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(GameConfig::parse("").ok(), Some(GameConfig::default()));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            GameConfig::parse("feed: [unterminated"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn feed_endpoint_env_override() {
        let mut config = GameConfig::default();
        config.apply_env_overrides(|key| {
            (key == "FEED_ENDPOINT").then(|| "https://worker.example/feed-photo".to_owned())
        });
        assert_eq!(config.feed.endpoint, "https://worker.example/feed-photo");

        let mut config = GameConfig::default();
        config.apply_env_overrides(|_| Some("   ".to_owned()));
        assert_eq!(config.feed.endpoint, default_feed_endpoint());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = GameConfig::from_file(Path::new("/nonexistent/khulark-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
