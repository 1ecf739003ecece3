use std::path::PathBuf;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::parsers::{parse_form_entry, parse_header};
use crate::args::{DocstressArgs, PositiveUsize};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Values given on the command
/// line or through the environment win.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut DocstressArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(
                parse_header(header)
                    .map_err(|err| AppError::config(ConfigError::InvalidHeader { source: err }))?,
            );
        }
        args.headers = parsed;
    }

    if !is_cli(matches, "form")
        && let Some(entries) = config.form.as_ref()
    {
        let mut parsed = Vec::with_capacity(entries.len());
        for entry in entries {
            parsed.push(
                parse_form_entry(entry)
                    .map_err(|err| AppError::config(ConfigError::InvalidForm { source: err }))?,
            );
        }
        args.form = parsed;
    }

    if !is_cli(matches, "payload")
        && let Some(payload) = config.payload
    {
        args.payload = payload;
    }

    if !is_cli(matches, "attachment")
        && let Some(path) = config.attachment.as_ref()
    {
        args.attachment = Some(PathBuf::from(path));
    }

    if !is_cli(matches, "attachment_mime")
        && let Some(mime) = config.attachment_mime.clone()
    {
        args.attachment_mime = Some(mime);
    }

    if !is_cli(matches, "prompt")
        && let Some(prompt) = config.prompt.clone()
    {
        args.prompt = Some(prompt);
    }

    if !is_cli(matches, "api_key")
        && let Some(key) = config.api_key.clone()
    {
        args.api_key = Some(key);
    }

    if !is_cli(matches, "requests")
        && !is_cli(matches, "until_stopped")
        && let Some(requests) = config.requests
    {
        args.requests = Some(requests);
    }

    if !is_cli(matches, "until_stopped")
        && !is_cli(matches, "requests")
        && let Some(until_stopped) = config.until_stopped
    {
        args.until_stopped = until_stopped;
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = ensure_positive_usize(concurrency, "concurrency")?;
    }

    if !is_cli(matches, "mode")
        && let Some(mode) = config.mode
    {
        args.mode = mode;
    }

    if !is_cli(matches, "workers")
        && let Some(workers) = config.workers
    {
        args.workers = Some(ensure_positive_usize(workers, "workers")?);
    }

    if !is_cli(matches, "timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.timeout = timeout
            .to_duration("timeout", true)
            .map_err(AppError::config)?;
    }

    if !is_cli(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = timeout
            .to_duration("connect_timeout", false)
            .map_err(AppError::config)?;
    }

    if !is_cli(matches, "batch_delay")
        && let Some(delay) = config.batch_delay.as_ref()
    {
        args.batch_delay = delay
            .to_duration("batch_delay", true)
            .map_err(AppError::config)?;
    }

    if !is_cli(matches, "stop_on_rate_limit")
        && let Some(stop) = config.stop_on_rate_limit
    {
        args.stop_on_rate_limit = stop;
    }

    if !is_cli(matches, "inspect_error_body")
        && let Some(inspect) = config.inspect_error_body
    {
        args.inspect_error_body = inspect;
    }

    if !is_cli(matches, "export_json")
        && let Some(path) = config.export_json.as_ref()
    {
        args.export_json = Some(PathBuf::from(path));
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}
