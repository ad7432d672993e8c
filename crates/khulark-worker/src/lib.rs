//! Feed-photo worker for the Khulark virtual pet.
//!
//! Accepts a photo over `POST /feed-photo`, asks an object-detection model
//! what is in it, then asks a language model, speaking as the creature,
//! what it eats and how that makes it feel. The answer is a
//! [`Decision`](khulark_types::Decision) of clamped stat deltas plus two
//! short lines of text.
//!
//! # Architecture
//!
//! ```text
//! multipart upload --> Detector --> PromptEngine --> LlmBackend --> parse --> Decision
//!                          \______________________________________________/
//!                                        any failure --> fallback
//! ```
//!
//! The service is stateless across requests. A remote failure never
//! reaches the client as an error; it is answered with a canned decision.

pub mod ai_client;
pub mod config;
pub mod detect;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod router;
pub mod server;
pub mod service;
pub mod state;

// Re-export primary types for convenience.
pub use config::{LogFormat, WorkerConfig};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use service::FeedPhotoService;
pub use state::AppState;
