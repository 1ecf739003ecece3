use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Method, Response, Url, header::HeaderMap};
use tracing::debug;

use crate::error::{AppResult, PayloadError};
use crate::outcome::{RawResult, TransportFailureKind};
use crate::payload::Payload;

use super::client::{HttpSettings, build_client, build_headers, to_method};

/// Performs the network call for one payload.
#[async_trait]
pub trait RequestSender: Send + Sync {
    /// Sends `payload`, giving up after `timeout` (zero disables the limit).
    ///
    /// # Errors
    ///
    /// Returns an error only when the request could not be assembled; every
    /// failure after dispatch is reported through [`RawResult`].
    async fn send(&self, payload: Payload, timeout: Duration) -> Result<RawResult, PayloadError>;
}

/// `reqwest`-backed sender for a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    method: Method,
    url: Url,
    headers: HeaderMap,
    api_key: Option<String>,
    inspect_error_body: bool,
}

impl HttpSender {
    /// Builds the shared client and header set.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built or a header is
    /// invalid.
    pub fn new(settings: &HttpSettings) -> AppResult<Self> {
        Ok(Self {
            client: build_client(settings)?,
            method: to_method(settings.method),
            url: settings.url.clone(),
            headers: build_headers(&settings.headers)?,
            api_key: settings.api_key.clone(),
            inspect_error_body: settings.inspect_error_body,
        })
    }

    async fn read_status(&self, response: Response) -> Result<u16, reqwest::Error> {
        let status = response.status().as_u16();
        if !self.inspect_error_body {
            drain_response_body(response).await?;
            return Ok(status);
        }
        let body = response.bytes().await?;
        Ok(embedded_error_code(&body).unwrap_or(status))
    }
}

#[async_trait]
impl RequestSender for HttpSender {
    async fn send(&self, payload: Payload, timeout: Duration) -> Result<RawResult, PayloadError> {
        let mut builder = self
            .client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        if let Some(key) = self.api_key.as_deref() {
            builder = builder.query(&[("key", key)]);
        }
        builder = match payload {
            Payload::Multipart(form) => builder.multipart(form),
            Payload::Json(body) => builder.json(&body),
            Payload::Empty => builder,
        };
        let request = builder
            .build()
            .map_err(|err| PayloadError::BuildRequest { source: err })?;

        let result = match self.client.execute(request).await {
            Ok(response) => self.read_status(response).await,
            Err(err) => Err(err),
        };
        Ok(match result {
            Ok(status) => RawResult::HttpResponse { status },
            Err(err) => {
                debug!("Request failed: {}", err);
                transport_result(&err)
            }
        })
    }
}

async fn drain_response_body(response: Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

/// Maps a `reqwest` failure onto the raw result the classifier expects.
pub(crate) fn transport_result(err: &reqwest::Error) -> RawResult {
    if err.is_timeout() {
        return RawResult::Aborted;
    }
    let kind = if err.is_connect() {
        TransportFailureKind::Connect
    } else if err.is_body() || err.is_decode() {
        TransportFailureKind::Body
    } else if err.is_redirect() {
        TransportFailureKind::Redirect
    } else if err.is_request() {
        TransportFailureKind::Request
    } else {
        TransportFailureKind::Other
    };
    RawResult::TransportFailure(kind)
}

/// Error code wrapped in a JSON body such as `{"error":{"code":429}}`.
pub(crate) fn embedded_error_code(body: &[u8]) -> Option<u16> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let code = value.pointer("/error/code")?.as_u64()?;
    u16::try_from(code).ok()
}
