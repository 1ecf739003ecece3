use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Url;

use crate::controller::{RequestBudget, RunConfig};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::HttpSettings;
use crate::payload::{
    FileResources, InlineJsonPayload, MultipartPayload, PayloadBuilder, mime_for_path,
};

use super::cli::DocstressArgs;
use super::defaults::{DEFAULT_PROMPT, DEFAULT_REQUESTS, default_worker_count};
use super::types::{FormFieldSpec, PayloadKind, RunMode};

/// What each request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSettings {
    Multipart {
        fields: Vec<FormFieldSpec>,
    },
    InlineJson {
        attachment: PathBuf,
        mime: String,
        prompt: String,
    },
}

impl PayloadSettings {
    /// Files that must be readable before the run starts.
    #[must_use]
    pub fn resource_paths(&self) -> Vec<PathBuf> {
        match self {
            Self::Multipart { fields } => fields
                .iter()
                .filter_map(FormFieldSpec::file_path)
                .cloned()
                .collect(),
            Self::InlineJson { attachment, .. } => vec![attachment.clone()],
        }
    }

    #[must_use]
    pub fn resources(&self) -> FileResources {
        FileResources::new(self.resource_paths())
    }

    #[must_use]
    pub fn builder(&self) -> Arc<dyn PayloadBuilder> {
        match self {
            Self::Multipart { fields } => Arc::new(MultipartPayload::new(fields.clone())),
            Self::InlineJson {
                attachment,
                mime,
                prompt,
            } => Arc::new(InlineJsonPayload::new(
                attachment.clone(),
                mime.clone(),
                prompt.clone(),
            )),
        }
    }
}

/// Validated view of the arguments, split by consumer.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub run: RunConfig,
    pub http: HttpSettings,
    pub payload: PayloadSettings,
    pub export_json: Option<PathBuf>,
}

impl RunSettings {
    /// Validates `args` and derives the run, HTTP and payload settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is missing or invalid, the payload is
    /// incomplete, or the request budget does not fit the dispatch mode.
    pub fn from_args(args: &DocstressArgs) -> AppResult<Self> {
        let url = parse_url(args.url.as_deref())?;
        let budget = request_budget(args)?;
        let payload = payload_settings(args)?;

        Ok(Self {
            run: RunConfig {
                budget,
                concurrency: args.concurrency.get(),
                timeout: args.timeout,
                batch_delay: args.batch_delay,
                worker_count: args
                    .workers
                    .map_or_else(default_worker_count, |workers| workers.get()),
                mode: args.mode.into(),
                stop_on_rate_limit: args.stop_on_rate_limit,
            },
            http: HttpSettings {
                method: args.method,
                url,
                headers: args.headers.clone(),
                api_key: args.api_key.clone(),
                connect_timeout: args.connect_timeout,
                inspect_error_body: args.inspect_error_body,
            },
            payload,
            export_json: args.export_json.clone(),
        })
    }
}

fn parse_url(url: Option<&str>) -> AppResult<Url> {
    let raw = url.ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
    let parsed = Url::parse(raw).map_err(|err| {
        AppError::validation(ValidationError::InvalidUrl {
            url: raw.to_owned(),
            source: err,
        })
    })?;
    if parsed.host_str().is_none() {
        return Err(AppError::validation(ValidationError::UrlMissingHost));
    }
    Ok(parsed)
}

fn request_budget(args: &DocstressArgs) -> AppResult<RequestBudget> {
    if !args.until_stopped {
        return Ok(RequestBudget::Fixed(
            args.requests.unwrap_or(DEFAULT_REQUESTS),
        ));
    }
    if args.requests.is_some() {
        return Err(AppError::validation(ValidationError::RequestBudgetConflict));
    }
    if args.mode == RunMode::Workers {
        return Err(AppError::validation(
            ValidationError::UntilStoppedWithWorkers,
        ));
    }
    Ok(RequestBudget::UntilStopped)
}

fn payload_settings(args: &DocstressArgs) -> AppResult<PayloadSettings> {
    match args.payload {
        PayloadKind::Multipart => {
            if args.form.is_empty() {
                return Err(AppError::validation(ValidationError::MultipartWithoutFields));
            }
            Ok(PayloadSettings::Multipart {
                fields: args.form.clone(),
            })
        }
        PayloadKind::InlineJson => {
            let attachment = args.attachment.clone().ok_or_else(|| {
                AppError::validation(ValidationError::InlineJsonWithoutAttachment)
            })?;
            let mime = args
                .attachment_mime
                .clone()
                .unwrap_or_else(|| mime_for_path(&attachment).to_owned());
            Ok(PayloadSettings::InlineJson {
                attachment,
                mime,
                prompt: args
                    .prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROMPT.to_owned()),
            })
        }
    }
}
