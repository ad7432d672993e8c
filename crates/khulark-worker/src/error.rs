//! Error types for the feed-photo worker.
//!
//! [`WorkerError`] covers everything that can go wrong between receiving a
//! photo and producing a decision. None of it reaches the client: the
//! service turns every `WorkerError` into a fallback decision. The only
//! failures the client sees are [`ApiError`]s, which describe a bad
//! request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors inside the arbitration pipeline.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A Workers AI call failed or answered with a non-success status.
    #[error("Workers AI error: {0}")]
    Upstream(String),

    /// The detection model returned something other than a detection list.
    #[error("detection error: {0}")]
    Detection(String),

    /// A language-model backend failed or returned an unexpected shape.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The model output did not contain a decision object.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Failed to load or render the persona template.
    #[error("template render error: {0}")]
    Template(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors returned to the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request did not carry a usable `image` file part.
    #[error("No image provided")]
    NoImage,

    /// The upload exceeded the configured size limit.
    #[error("Image too large")]
    TooLarge,

    /// No route matched.
    #[error("Not Found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NoImage => StatusCode::BAD_REQUEST,
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
