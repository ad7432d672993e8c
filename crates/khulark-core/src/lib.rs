//! Game core for the Khulark virtual pet.
//!
//! This crate owns everything that happens on the player's side: the
//! persisted stats and their lazy decay, the mood policy that turns stats
//! into presentation tags, the cooldown gates, and the client that sends
//! photos to the feed-photo worker.
//!
//! # Modules
//!
//! - [`clock`] -- Wall-clock abstraction with a manual clock for tests.
//! - [`config`] -- Configuration loading from `khulark-config.yaml`.
//! - [`cooldown`] -- Dynamic feed cooldown and per-action cooldown gates.
//! - [`decay`] -- Hourly stat decay.
//! - [`error`] -- Storage and feeding error types.
//! - [`feeding`] -- [`FeedingArbiter`], the photo upload client.
//! - [`mood`] -- Body state, mood category, and presentation lookups.
//! - [`session`] -- [`GameSession`], the surface renderers talk to.
//! - [`storage`] -- File and in-memory save storage.
//! - [`store`] -- [`StatStore`], the persisted creature state.
//!
//! [`FeedingArbiter`]: feeding::FeedingArbiter
//! [`GameSession`]: session::GameSession
//! [`StatStore`]: store::StatStore

pub mod clock;
pub mod config;
pub mod cooldown;
pub mod decay;
pub mod error;
pub mod feeding;
pub mod mood;
pub mod session;
pub mod storage;
pub mod store;
