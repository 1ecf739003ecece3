use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{error, info};

use crate::args::{DocstressArgs, RunSettings};
use crate::config::{apply_config, load_config};
use crate::controller::{FinalReport, RequestBudget, RunController, RunParts};
use crate::error::AppResult;
use crate::executor::RequestExecutor;
use crate::http::HttpSender;
use crate::progress::LogProgress;
use crate::shutdown::{setup_signal_stop_handler, shutdown_channel};
use crate::sinks::{ConsoleReport, JsonReport, ReportSink};

/// Default config filenames checked when no CLI args are provided.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["docstress.toml", "docstress.json"];

/// Parses the command line, loads config and runs one load test.
///
/// # Errors
///
/// Returns an error when arguments or config are invalid, the run is
/// aborted before start, or the report cannot be written.
pub fn run() -> AppResult<()> {
    let (args, matches) = match parse_args()? {
        Some(parsed) => parsed,
        None => return Ok(()),
    };

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(args, &matches))
}

fn parse_args() -> AppResult<Option<(DocstressArgs, ArgMatches)>> {
    let mut cmd = DocstressArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = DocstressArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

async fn run_async(mut args: DocstressArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, matches, &config)?;
    }
    let settings = RunSettings::from_args(&args)?;
    run_load_test(settings).await.map(|_| ())
}

/// Runs one load test with Ctrl+C/SIGTERM wired to a graceful stop.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built, the run is
/// aborted before start, or a report sink fails.
pub async fn run_load_test(settings: RunSettings) -> AppResult<FinalReport> {
    let sender = HttpSender::new(&settings.http)?;
    let executor = RequestExecutor::new(
        settings.payload.builder(),
        Arc::new(sender),
        settings.run.timeout,
    );

    let mut sinks: Vec<Arc<dyn ReportSink>> = vec![Arc::new(ConsoleReport)];
    if let Some(path) = settings.export_json {
        sinks.push(Arc::new(JsonReport::new(path)));
    }

    info!("Target: {}", settings.http.url);
    match settings.run.budget {
        RequestBudget::Fixed(total) => info!("Total Requests: {}", total),
        RequestBudget::UntilStopped => info!("Total Requests: until stopped"),
    }
    info!(
        "Mode: {:?}, concurrency {}, workers {}",
        settings.run.mode, settings.run.concurrency, settings.run.worker_count
    );

    let controller = RunController::new(
        settings.run,
        RunParts {
            executor,
            resources: Arc::new(settings.payload.resources()),
            progress: Arc::new(LogProgress),
            stop_conditions: Vec::new(),
            sinks,
        },
    );

    let (shutdown_tx, _) = shutdown_channel();
    let signal_handle = setup_signal_stop_handler(&shutdown_tx, controller.lifecycle());
    let result = controller.run().await;
    drop(shutdown_tx.send(()));
    signal_handle.await?;

    if let Err(err) = &result
        && err.is_aborted_before_start()
    {
        error!("{}", err);
    }
    result
}
