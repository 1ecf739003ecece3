use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration;
use crate::args::{HttpMethod, PayloadKind, RunMode};
use crate::error::{ConfigError, ValidationError};

/// Contents of `docstress.toml` / `docstress.json`. Keys mirror the long CLI
/// flags with `-` replaced by `_`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub headers: Option<Vec<String>>,
    pub form: Option<Vec<String>>,
    pub payload: Option<PayloadKind>,
    pub attachment: Option<String>,
    pub attachment_mime: Option<String>,
    pub prompt: Option<String>,
    pub api_key: Option<String>,
    pub requests: Option<u64>,
    pub until_stopped: Option<bool>,
    pub concurrency: Option<usize>,
    pub mode: Option<RunMode>,
    pub workers: Option<usize>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub batch_delay: Option<DurationValue>,
    pub stop_on_rate_limit: Option<bool>,
    pub inspect_error_body: Option<bool>,
    pub export_json: Option<String>,
}

/// Either plain seconds or a string with a unit suffix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(
        &self,
        field: &'static str,
        allow_zero: bool,
    ) -> Result<Duration, ConfigError> {
        let duration = match self {
            DurationValue::Seconds(secs) => Duration::from_secs(*secs),
            DurationValue::Text(text) => parse_duration(text)
                .map_err(|err| ConfigError::InvalidDuration { field, source: err })?,
        };
        if duration.is_zero() && !allow_zero {
            return Err(ConfigError::InvalidDuration {
                field,
                source: ValidationError::DurationZero,
            });
        }
        Ok(duration)
    }
}
