use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::OnceCell;

use crate::error::PayloadError;

use super::{Payload, PayloadBuilder};

/// JSON body carrying the attachment inline as base64, in the
/// `contents[].parts[]` shape used by generative model APIs.
///
/// The attachment is encoded once, on first use, and shared by every
/// request after that.
#[derive(Debug, Clone)]
pub struct InlineJsonPayload {
    attachment: PathBuf,
    mime: String,
    prompt: String,
    encoded: Arc<OnceCell<Arc<str>>>,
}

impl InlineJsonPayload {
    #[must_use]
    pub fn new(attachment: PathBuf, mime: String, prompt: String) -> Self {
        Self {
            attachment,
            mime,
            prompt,
            encoded: Arc::new(OnceCell::new()),
        }
    }

    async fn encoded(&self) -> Result<Arc<str>, PayloadError> {
        let encoded = self
            .encoded
            .get_or_try_init(|| async {
                let bytes = tokio::fs::read(&self.attachment).await.map_err(|err| {
                    PayloadError::ReadFile {
                        path: self.attachment.clone(),
                        source: err,
                    }
                })?;
                Ok::<_, PayloadError>(Arc::from(STANDARD.encode(bytes)))
            })
            .await?;
        Ok(Arc::clone(encoded))
    }
}

#[async_trait]
impl PayloadBuilder for InlineJsonPayload {
    async fn build(&self, request_id: u64) -> Result<Payload, PayloadError> {
        let data = self.encoded().await?;
        let body = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        { "text": format!("REQ-{} - {}", request_id, self.prompt) },
                        {
                            "inlineData": {
                                "mimeType": self.mime,
                                "data": &*data,
                            }
                        }
                    ]
                }
            ]
        });
        Ok(Payload::Json(body))
    }
}
