use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce or dispatch a request before it reached the network.
///
/// The display text becomes the outcome's error message, so it is kept
/// short and stable for the error histogram.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("File error: {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Request error: invalid MIME type '{mime}': {source}")]
    InvalidMime {
        mime: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request error: {source}")]
    BuildRequest {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request error: {message}")]
    Other { message: String },
}
