//! Request payload construction and pre-flight file checks.
mod inline;
mod multipart;
mod resources;


use async_trait::async_trait;

use crate::error::PayloadError;

pub use inline::InlineJsonPayload;
pub use multipart::{MultipartPayload, mime_for_path};
pub use resources::{FileResources, ResourceCheck};

/// Body of one request.
#[derive(Debug)]
pub enum Payload {
    Multipart(reqwest::multipart::Form),
    Json(serde_json::Value),
    Empty,
}

/// Produces a fresh payload for every dispatched request.
#[async_trait]
pub trait PayloadBuilder: Send + Sync {
    /// Builds the payload for `request_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload cannot be assembled (for example an
    /// attachment became unreadable mid-run).
    async fn build(&self, request_id: u64) -> Result<Payload, PayloadError>;
}
