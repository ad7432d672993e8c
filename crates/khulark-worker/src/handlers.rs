//! HTTP handlers for the feed-photo server.
//!
//! | Method    | Path          | Description                       |
//! |-----------|---------------|-----------------------------------|
//! | `POST`    | `/feed-photo` | Multipart photo in, decision out  |
//! | `OPTIONS` | any           | CORS preflight (answered by CORS) |
//! | any       | other         | `404 {"error": "Not Found"}`      |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::http::StatusCode;
use khulark_types::Decision;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::fallback;
use crate::state::AppState;

/// Multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

/// Decide what the creature makes of the uploaded photo.
///
/// Only a missing or unusable `image` part (or an oversized upload) is
/// reported as an error. Once an `image` file part has been found the
/// answer is always `200` with a decision: a body that breaks off inside
/// the image gets the fixed fallback.
pub async fn feed_photo(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Decision>, ApiError> {
    let span = info_span!("feed_photo", request_id = %Uuid::now_v7());
    handle_feed_photo(&state, multipart).instrument(span).await
}

async fn handle_feed_photo(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Decision>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        warn!(error = %rejection, "request is not a multipart upload");
        ApiError::NoImage
    })?;
    let image = match read_image(multipart).await? {
        Upload::Image(image) => image,
        Upload::Broken => {
            info!("image part unreadable, answering fixed fallback");
            return Ok(Json(fallback::fixed()));
        }
    };
    info!(bytes = image.len(), "photo received");

    let decision = state.service.arbitrate(&image).await;
    info!(
        hunger = decision.hunger,
        affection = decision.affection,
        sanity = decision.sanity,
        "decision sent"
    );
    Ok(Json(decision))
}

/// Answer unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// What the `image` part of an upload yielded.
#[derive(Debug)]
enum Upload {
    /// The complete, non-empty photo.
    Image(Bytes),
    /// An `image` file part was present but its body could not be read.
    Broken,
}

/// Read the first `image` part, which must be a non-empty file.
///
/// Errors before that part is found mean no image was provided. Errors
/// while reading it leave the upload [`Upload::Broken`], except for the
/// size limit, which is always [`ApiError::TooLarge`].
async fn read_image(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(field_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        if field.file_name().is_none() {
            debug!("image part is not a file");
            return Err(ApiError::NoImage);
        }
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if is_too_large(&e) => return Err(field_error(e)),
            Err(e) => {
                warn!(error = %e, "image part broke off mid-stream");
                return Ok(Upload::Broken);
            }
        };
        if bytes.is_empty() {
            debug!("image part is empty");
            return Err(ApiError::NoImage);
        }
        return Ok(Upload::Image(bytes));
    }
    Err(ApiError::NoImage)
}

fn is_too_large(error: &MultipartError) -> bool {
    error.status() == StatusCode::PAYLOAD_TOO_LARGE
}

fn field_error(error: MultipartError) -> ApiError {
    if is_too_large(&error) {
        warn!(error = %error, "upload over the size limit");
        ApiError::TooLarge
    } else {
        warn!(error = %error, "malformed multipart body");
        ApiError::NoImage
    }
}
