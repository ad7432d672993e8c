//! Error types for the game core.
//!
//! Most failures here are absorbed before they reach the player: a broken
//! save becomes a fresh creature, a failed write is logged, and a failed
//! feeding request becomes a fallback reaction. These enums carry the
//! detail for the logs.

/// Errors from the save storage back-ends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the save file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serialized document does not fit in the storage quota.
    #[error("storage quota exceeded: {attempted} bytes, limit {limit}")]
    QuotaExceeded {
        /// Size of the rejected write.
        attempted: usize,
        /// The configured quota.
        limit: usize,
    },

    /// The document could not be serialized.
    #[error("save serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A lock guarding in-memory storage was poisoned.
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

/// Errors from submitting a photo to the feed endpoint.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The request could not be built or sent.
    #[error("feed request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("feed endpoint returned {0}")]
    Status(u16),

    /// The response body was not a decision.
    #[error("feed response decode failed: {0}")]
    Decode(String),
}
