//! Client side of photo feeding.
//!
//! [`FeedingArbiter`] uploads a photo to the feed-photo endpoint and turns
//! whatever comes back into a [`Verdict`]. It never fails: a transport
//! error, a non-success status, or a body that is not a JSON object all
//! become [`Verdict::Fallback`] carrying [`client_fallback`].

use std::time::Duration;

use khulark_types::Decision;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::error::FeedError;

/// Multipart field name carrying the photo.
pub const IMAGE_FIELD: &str = "image";

/// File name sent with every upload.
const UPLOAD_FILE_NAME: &str = "photo.jpg";

/// Content type sent with every upload.
const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";

/// Reaction shown when the feed request fails on the client side.
pub fn client_fallback() -> Decision {
    Decision::new(
        0.0,
        -5.0,
        -10.0,
        "Something feels wrong. I don't like this at all...",
        "The khulark recoils from the strange offering.",
    )
}

/// The result of one photo submission.
#[derive(Debug)]
pub enum Verdict {
    /// The endpoint answered with a decision.
    Decided(Decision),
    /// The request failed; `decision` is the client fallback.
    Fallback {
        /// Reaction to show the player.
        decision: Decision,
        /// Why the request failed.
        reason: FeedError,
    },
}

impl Verdict {
    /// The decision to present, whichever path produced it.
    pub const fn decision(&self) -> &Decision {
        match self {
            Self::Decided(decision) | Self::Fallback { decision, .. } => decision,
        }
    }

    /// Whether the request failed.
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Which sound plays after a feeding, keyed on the total stat change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionCue {
    /// Total change above 15.
    Feast,
    /// Total change above 0.
    Eating,
    /// Anything else.
    Recoil,
}

impl ReactionCue {
    /// Pick the cue for a decision.
    pub fn for_decision(decision: &Decision) -> Self {
        let total = decision.total_change();
        if total > 15.0 {
            Self::Feast
        } else if total > 0.0 {
            Self::Eating
        } else {
            Self::Recoil
        }
    }

    /// Asset key of the sound effect.
    pub const fn sound_key(self) -> &'static str {
        match self {
            Self::Feast => "feed",
            Self::Eating => "eating",
            Self::Recoil => "reaction",
        }
    }
}

/// Uploads photos to the feed-photo endpoint.
#[derive(Debug, Clone)]
pub struct FeedingArbiter {
    client: reqwest::Client,
    endpoint: String,
}

impl FeedingArbiter {
    /// Create an arbiter for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Request`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Request(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Create an arbiter around an existing client.
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint photos are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload `photo` and return the resulting verdict.
    pub async fn submit_photo(&self, photo: Vec<u8>) -> Verdict {
        match self.request(photo).await {
            Ok(decision) => {
                debug!(
                    hunger = decision.hunger,
                    affection = decision.affection,
                    sanity = decision.sanity,
                    "feed decision received"
                );
                Verdict::Decided(decision)
            }
            Err(reason) => {
                warn!(error = %reason, endpoint = %self.endpoint, "feed request failed, using fallback");
                Verdict::Fallback {
                    decision: client_fallback(),
                    reason,
                }
            }
        }
    }

    async fn request(&self, photo: Vec<u8>) -> Result<Decision, FeedError> {
        let part = Part::bytes(photo)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_CONTENT_TYPE)
            .map_err(|e| FeedError::Request(e.to_string()))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        Decision::from_value(&body)
            .ok_or_else(|| FeedError::Decode("response is not a JSON object".to_owned()))
    }
}
