use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::args::FormFieldSpec;
use crate::error::PayloadError;

use super::{Payload, PayloadBuilder};

/// Multipart form upload; file fields are read from disk per request.
#[derive(Debug, Clone)]
pub struct MultipartPayload {
    fields: Arc<[FormFieldSpec]>,
}

impl MultipartPayload {
    #[must_use]
    pub fn new(fields: Vec<FormFieldSpec>) -> Self {
        Self {
            fields: fields.into(),
        }
    }
}

#[async_trait]
impl PayloadBuilder for MultipartPayload {
    async fn build(&self, _request_id: u64) -> Result<Payload, PayloadError> {
        let mut form = reqwest::multipart::Form::new();
        for field in self.fields.iter() {
            match field {
                FormFieldSpec::Text { name, value } => {
                    form = form.text(name.clone(), value.clone());
                }
                FormFieldSpec::File { name, path } => {
                    let bytes =
                        tokio::fs::read(path)
                            .await
                            .map_err(|err| PayloadError::ReadFile {
                                path: path.clone(),
                                source: err,
                            })?;
                    let mime = mime_for_path(path);
                    let part = reqwest::multipart::Part::bytes(bytes)
                        .file_name(file_name(path))
                        .mime_str(mime)
                        .map_err(|err| PayloadError::InvalidMime {
                            mime: mime.to_owned(),
                            source: err,
                        })?;
                    form = form.part(name.clone(), part);
                }
            }
        }
        Ok(Payload::Multipart(form))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("file")
        .to_owned()
}

/// Content type for an upload, picked from the file extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some(_) | None => "application/octet-stream",
    }
}
