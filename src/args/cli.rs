use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use super::parsers::{
    parse_duration_arg, parse_duration_value, parse_form_entry, parse_header,
    parse_positive_usize,
};
use super::types::{FormFieldSpec, HttpMethod, PayloadKind, PositiveUsize, RunMode};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP load tester for document upload endpoints: multipart or inline-JSON file payloads, batch or worker dispatch, rate-limit aware."
)]
pub struct DocstressArgs {
    /// HTTP method to use
    #[arg(long, short = 'X', default_value = "post", ignore_case = true)]
    pub method: HttpMethod,

    /// Target URL for the load test
    #[arg(long, short)]
    pub url: Option<String>,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Multipart fields as 'name=value' or 'name=@path' (repeatable)
    #[arg(long = "form", short = 'F', value_parser = parse_form_entry)]
    pub form: Vec<FormFieldSpec>,

    /// Request body shape
    #[arg(long, value_enum, default_value = "multipart")]
    pub payload: PayloadKind,

    /// File inlined as base64 by the inline-json payload
    #[arg(long)]
    pub attachment: Option<PathBuf>,

    /// MIME type of the attachment (derived from its extension by default)
    #[arg(long = "attachment-mime")]
    pub attachment_mime: Option<String>,

    /// Prompt text placed next to the attachment (inline-json payload)
    #[arg(long)]
    pub prompt: Option<String>,

    /// API key sent as the `key` query parameter
    #[arg(long = "api-key", env = "DOCSTRESS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Total number of requests (default: 100)
    #[arg(long, short = 'n', conflicts_with = "until_stopped")]
    pub requests: Option<u64>,

    /// Keep sending batches until a stop condition or signal ends the run
    #[arg(long = "until-stopped")]
    pub until_stopped: bool,

    /// Requests in flight per batch
    #[arg(
        long,
        short = 'c',
        default_value = "10",
        value_parser = parse_positive_usize
    )]
    pub concurrency: PositiveUsize,

    /// How requests are spread over executors
    #[arg(long, value_enum, default_value = "batch")]
    pub mode: RunMode,

    /// Worker tasks in workers mode (default: available CPUs - 1)
    #[arg(long, short = 'w', value_parser = parse_positive_usize)]
    pub workers: Option<PositiveUsize>,

    /// Per-request timeout, 0 disables it (supports ms/s/m/h)
    #[arg(long, default_value = "60s", value_parser = parse_duration_value)]
    pub timeout: Duration,

    /// Timeout for establishing a new connection (supports ms/s/m/h)
    #[arg(
        long = "connect-timeout",
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub connect_timeout: Duration,

    /// Pause between batches (supports ms/s/m/h)
    #[arg(long = "batch-delay", default_value = "50ms", value_parser = parse_duration_value)]
    pub batch_delay: Duration,

    /// Stop dispatching after the first HTTP 429
    #[arg(long = "stop-on-rate-limit")]
    pub stop_on_rate_limit: bool,

    /// Treat `{"error":{"code":N}}` response bodies as status N
    #[arg(long = "inspect-error-body")]
    pub inspect_error_body: bool,

    /// Write the final report as JSON to this path
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Enable verbose logging (sets log level to debug unless overridden by DOCSTRESS_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./docstress.toml or ./docstress.json if present.
    #[arg(long)]
    pub config: Option<String>,
}
