//! Shared application state for the feed-photo server.

use crate::service::FeedPhotoService;

/// State shared by every request handler.
///
/// Requests are independent, so nothing in here is mutable.
#[derive(Debug)]
pub struct AppState {
    /// The arbitration pipeline.
    pub service: FeedPhotoService,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wrap a service with its upload limit.
    pub const fn new(service: FeedPhotoService, max_upload_bytes: usize) -> Self {
        Self {
            service,
            max_upload_bytes,
        }
    }
}
