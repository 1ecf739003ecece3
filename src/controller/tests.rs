use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::error::{AppError, ResourceError, RunError};
use crate::executor::testing::{ScriptedSender, StaticBuilder};
use crate::error::PayloadError;
use crate::http::RequestSender;
use crate::outcome::RawResult;
use crate::payload::Payload;
use crate::progress::{ProgressReporter, ProgressUpdate};

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

#[derive(Debug, Default)]
struct RecordingProgress {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, update: ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }
}

#[derive(Debug, Default)]
struct RecordingSink {
    reports: Mutex<Vec<FinalReport>>,
}

impl RecordingSink {
    fn reports(&self) -> Vec<FinalReport> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn emit(&self, report: &FinalReport) -> AppResult<()> {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report.clone());
        }
        Ok(())
    }
}

#[derive(Debug)]
struct StaticResources {
    missing: Option<PathBuf>,
}

#[async_trait]
impl ResourceCheck for StaticResources {
    async fn check(&self) -> Result<(), ResourceError> {
        match &self.missing {
            Some(path) => Err(ResourceError::NotAFile { path: path.clone() }),
            None => Ok(()),
        }
    }
}

struct Harness {
    controller: RunController,
    sender: Arc<ScriptedSender>,
    sink: Arc<RecordingSink>,
}

fn harness(config: RunConfig, sender: ScriptedSender, missing: Option<PathBuf>) -> Harness {
    let sender = Arc::new(sender);
    let sink = Arc::new(RecordingSink::default());
    let controller = RunController::new(
        config,
        RunParts {
            executor: RequestExecutor::new(
                Arc::new(StaticBuilder::default()),
                sender.clone(),
                Duration::from_secs(1),
            ),
            resources: Arc::new(StaticResources { missing }),
            progress: Arc::new(RecordingProgress::default()),
            stop_conditions: Vec::new(),
            sinks: vec![sink.clone()],
        },
    );
    Harness {
        controller,
        sender,
        sink,
    }
}

fn batch_config(total: u64, concurrency: usize) -> RunConfig {
    RunConfig {
        budget: RequestBudget::Fixed(total),
        concurrency,
        timeout: Duration::from_secs(1),
        batch_delay: Duration::ZERO,
        worker_count: 1,
        mode: DispatchMode::Batch,
        stop_on_rate_limit: true,
    }
}

fn workers_config(total: u64, worker_count: usize) -> RunConfig {
    RunConfig {
        worker_count,
        mode: DispatchMode::Workers,
        ..batch_config(total, 1)
    }
}

/// Successes, 500s and timeouts in a fixed ratio for `total` requests.
fn mixed_script(total: u64) -> Vec<RawResult> {
    (0..total)
        .map(|id| match id % 5 {
            3 => RawResult::HttpResponse { status: 500 },
            4 => RawResult::Aborted,
            _ => RawResult::HttpResponse { status: 201 },
        })
        .collect()
}

/// Sender whose `crash_on`-th call unwinds, killing the task driving it.
#[derive(Debug)]
struct CrashingSender {
    crash_on: u64,
    calls: AtomicU64,
}

#[async_trait]
impl RequestSender for CrashingSender {
    async fn send(
        &self,
        _payload: Payload,
        _timeout: Duration,
    ) -> Result<RawResult, PayloadError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        tokio::time::sleep(Duration::from_millis(1)).await;
        if call == self.crash_on {
            std::panic::panic_any("sender crashed");
        }
        Ok(RawResult::HttpResponse { status: 200 })
    }
}

fn ok_sender() -> ScriptedSender {
    ScriptedSender::always(RawResult::HttpResponse { status: 200 })
}

#[test]
fn lifecycle_rejects_skipped_and_repeated_transitions() -> Result<(), String> {
    let lifecycle = RunLifecycle::new();
    if lifecycle.transition(RunState::Draining).is_ok() {
        return Err("Idle -> Draining must be rejected".to_owned());
    }
    for state in [RunState::Running, RunState::Draining, RunState::Finished] {
        lifecycle.transition(state).map_err(|err| err.to_string())?;
    }
    match lifecycle.transition(RunState::Finished) {
        Err(RunError::InvalidTransition {
            from: RunState::Finished,
            to: RunState::Finished,
        }) => {}
        other => return Err(format!("Expected InvalidTransition, got {:?}", other)),
    }
    if lifecycle.request_stop(StopReason::Interrupted) {
        return Err("A finished run must ignore stop requests".to_owned());
    }
    Ok(())
}

#[test]
fn first_stop_reason_wins() -> Result<(), String> {
    let lifecycle = RunLifecycle::new();
    if lifecycle.request_stop(StopReason::Interrupted) {
        return Err("An idle run must ignore stop requests".to_owned());
    }
    lifecycle
        .transition(RunState::Running)
        .map_err(|err| err.to_string())?;
    if !lifecycle.request_stop(StopReason::RateLimited { status: 429 }) {
        return Err("A running run must accept a stop".to_owned());
    }
    if lifecycle.request_stop(StopReason::Interrupted) {
        return Err("A second stop must be ignored".to_owned());
    }
    if lifecycle.stop_reason() != Some(StopReason::RateLimited { status: 429 }) {
        return Err(format!("Unexpected reason: {:?}", lifecycle.stop_reason()));
    }
    if lifecycle.is_dispatch_allowed() {
        return Err("Draining must block new dispatches".to_owned());
    }
    lifecycle.finish_dispatch().map_err(|err| err.to_string())
}

#[test]
fn completed_run_reports_all_successes() -> Result<(), String> {
    run_async_test(async {
        let harness = harness(batch_config(20, 5), ok_sender(), None);
        let report = harness
            .controller
            .run()
            .await
            .map_err(|err| err.to_string())?;
        if report.success_count != 20 || report.failure_count != 0 {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if !report.completed() || report.stop_reason.is_some() {
            return Err("Run should be complete".to_owned());
        }
        if harness.sink.reports().len() != 1 {
            return Err("The sink must receive exactly one report".to_owned());
        }
        if harness.controller.lifecycle().state() != RunState::Finished {
            return Err("Run must end Finished".to_owned());
        }
        Ok(())
    })
}

#[test]
fn all_failures_still_produce_report() -> Result<(), String> {
    run_async_test(async {
        let harness = harness(
            batch_config(12, 4),
            ScriptedSender::always(RawResult::HttpResponse { status: 500 }),
            None,
        );
        let report = harness
            .controller
            .run()
            .await
            .map_err(|err| err.to_string())?;
        if report.failure_count != 12 || report.success_count != 0 {
            return Err(format!("Unexpected report: {:?}", report));
        }
        let first = report.errors.first().map(|error| (error.message.as_str(), error.count));
        if first != Some(("HTTP error: 500", 12)) {
            return Err(format!("Unexpected breakdown: {:?}", report.errors));
        }
        if report.min_time != Duration::ZERO || report.max_time != Duration::ZERO {
            return Err("Times must be zero without successes".to_owned());
        }
        Ok(())
    })
}

#[test]
fn rate_limit_stops_dispatching() -> Result<(), String> {
    run_async_test(async {
        let mut script = vec![RawResult::HttpResponse { status: 200 }; 6];
        script.push(RawResult::HttpResponse { status: 429 });
        let sender = ScriptedSender::new(
            script,
            RawResult::HttpResponse { status: 200 },
            Duration::from_millis(1),
        );
        let harness = harness(batch_config(100, 10), sender, None);
        let report = harness
            .controller
            .run()
            .await
            .map_err(|err| err.to_string())?;

        if report.total_requests < 7 || report.total_requests > 70 {
            return Err(format!("Processed {} requests", report.total_requests));
        }
        if harness.sender.calls() != report.total_requests {
            return Err("Every dispatched request must be folded".to_owned());
        }
        if report.stop_reason != Some(StopReason::RateLimited { status: 429 }) {
            return Err(format!("Unexpected stop reason: {:?}", report.stop_reason));
        }
        if report.completed() {
            return Err("A stopped run is not complete".to_owned());
        }
        Ok(())
    })
}

#[test]
fn resource_error_aborts_before_running() -> Result<(), String> {
    run_async_test(async {
        let harness = harness(
            batch_config(10, 2),
            ok_sender(),
            Some(PathBuf::from("missing.pdf")),
        );
        match harness.controller.run().await {
            Err(err) if err.is_aborted_before_start() => {}
            Err(err) => return Err(format!("Unexpected error: {}", err)),
            Ok(report) => return Err(format!("Unexpected report: {:?}", report)),
        }
        if harness.controller.lifecycle().state() != RunState::Idle {
            return Err("Aborted run must stay Idle".to_owned());
        }
        if harness.sender.calls() != 0 || !harness.sink.reports().is_empty() {
            return Err("Aborted run must not send or report".to_owned());
        }
        Ok(())
    })
}

#[test]
fn second_run_is_rejected() -> Result<(), String> {
    run_async_test(async {
        let harness = harness(batch_config(3, 3), ok_sender(), None);
        harness
            .controller
            .run()
            .await
            .map_err(|err| err.to_string())?;
        match harness.controller.run().await {
            Err(AppError::Run(RunError::InvalidTransition { .. })) => {}
            Err(err) => return Err(format!("Unexpected error: {}", err)),
            Ok(_) => return Err("A finished run must not run again".to_owned()),
        }
        if harness.sink.reports().len() != 1 {
            return Err("Report must be emitted once".to_owned());
        }
        Ok(())
    })
}

#[test]
fn external_stop_ends_open_ended_run() -> Result<(), String> {
    run_async_test(async {
        let mut config = batch_config(0, 4);
        config.budget = RequestBudget::UntilStopped;
        let sender = ScriptedSender::new(
            Vec::new(),
            RawResult::HttpResponse { status: 200 },
            Duration::from_millis(2),
        );
        let harness = harness(config, sender, None);
        let lifecycle = harness.controller.lifecycle();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            lifecycle.request_stop(StopReason::Interrupted)
        });

        let report = harness
            .controller
            .run()
            .await
            .map_err(|err| err.to_string())?;
        let stopped = stopper
            .await
            .map_err(|err| format!("stopper failed: {}", err))?;
        if !stopped {
            return Err("Stop request should have been accepted".to_owned());
        }
        if report.stop_reason != Some(StopReason::Interrupted) || report.planned_requests.is_some()
        {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if report.total_requests == 0 || report.total_requests % 4 != 0 {
            return Err(format!(
                "Open-ended batches must complete whole: {}",
                report.total_requests
            ));
        }
        Ok(())
    })
}

#[test]
fn zero_requests_reports_empty_run() -> Result<(), String> {
    run_async_test(async {
        let harness = harness(batch_config(0, 4), ok_sender(), None);
        let report = harness
            .controller
            .run()
            .await
            .map_err(|err| err.to_string())?;
        if report.total_requests != 0 || report.requests_per_second_x100 != 0 {
            return Err(format!("Unexpected report: {:?}", report));
        }
        if !report.completed() {
            return Err("Empty run is complete".to_owned());
        }
        Ok(())
    })
}

#[test]
fn report_sorts_errors_and_computes_percentiles() -> Result<(), String> {
    let mut stats = crate::aggregator::RunStats::new(chrono::Utc::now());
    for (id, elapsed) in (0_u64..).zip([30_u64, 10, 20, 40, 50]) {
        stats.fold(&crate::outcome::Outcome::success(
            id,
            200,
            Duration::from_millis(elapsed),
        ));
    }
    let failures = [
        RawResult::Aborted,
        RawResult::HttpResponse { status: 502 },
        RawResult::HttpResponse { status: 500 },
        RawResult::HttpResponse { status: 500 },
    ];
    for (id, raw) in (10_u64..).zip(failures) {
        stats.fold(&crate::outcome::classify(id, raw, Duration::from_millis(1)));
    }

    let report = FinalReport::from_stats(&stats, Duration::from_secs(2), Some(9), None);
    let order: Vec<&str> = report
        .errors
        .iter()
        .map(|error| error.message.as_str())
        .collect();
    if order != vec!["HTTP error: 500", "HTTP error: 502", "Request timeout"] {
        return Err(format!("Unexpected order: {:?}", order));
    }
    if report.p50 != Duration::from_millis(30) || report.p99 != Duration::from_millis(50) {
        return Err(format!("Unexpected percentiles: {:?}/{:?}", report.p50, report.p99));
    }
    if report.average_time != Duration::from_millis(30) {
        return Err(format!("Unexpected average: {:?}", report.average_time));
    }
    if report.requests_per_second_x100 != 450 || report.success_rate_x100 != 5_555 {
        return Err(format!(
            "Unexpected rates: {} / {}",
            report.requests_per_second_x100, report.success_rate_x100
        ));
    }
    Ok(())
}

#[test]
fn batch_and_worker_modes_fold_the_same_mix() -> Result<(), String> {
    run_async_test(async {
        for (total, worker_count) in [(37_u64, 4_usize), (5, 8), (100, 7), (0, 3)] {
            let mut reports = Vec::new();
            for config in [batch_config(total, 4), workers_config(total, worker_count)] {
                let mode = config.mode;
                let sender = ScriptedSender::new(
                    mixed_script(total),
                    RawResult::HttpResponse { status: 201 },
                    Duration::from_millis(1),
                );
                let harness = harness(config, sender, None);
                let report = harness
                    .controller
                    .run()
                    .await
                    .map_err(|err| format!("{:?} run failed: {}", mode, err))?;

                if report.success_count.saturating_add(report.failure_count) != total
                    || report.total_requests != total
                {
                    return Err(format!("{:?} lost outcomes: {:?}", mode, report));
                }
                if report.timeout_count > report.failure_count {
                    return Err(format!("{:?} timeouts exceed failures", mode));
                }
                if report.success_count > 0
                    && (report.min_time < Duration::from_millis(1)
                        || report.max_time < report.min_time)
                {
                    return Err(format!(
                        "{:?} bad time bounds: {:?}..{:?}",
                        mode, report.min_time, report.max_time
                    ));
                }
                if !report.completed() || harness.sender.calls() != total {
                    return Err(format!("{:?} run incomplete: {:?}", mode, report));
                }
                reports.push(report);
            }

            let [batch, workers] = reports.as_slice() else {
                return Err("Expected one report per mode".to_owned());
            };
            let counts = |report: &FinalReport| {
                (
                    report.success_count,
                    report.failure_count,
                    report.timeout_count,
                    report.errors.clone(),
                )
            };
            if counts(batch) != counts(workers) {
                return Err(format!(
                    "Modes disagree for ({}, {}): {:?} vs {:?}",
                    total,
                    worker_count,
                    counts(batch),
                    counts(workers)
                ));
            }
            let expected_timeouts = (0..total).filter(|id| id % 5 == 4).count();
            if usize::try_from(batch.timeout_count).ok() != Some(expected_timeouts) {
                return Err(format!("Unexpected timeout count {}", batch.timeout_count));
            }
        }
        Ok(())
    })
}

#[test]
fn crashed_worker_still_reports_and_finishes() -> Result<(), String> {
    run_async_test(async {
        let sender = Arc::new(CrashingSender {
            crash_on: 4,
            calls: AtomicU64::new(0),
        });
        let sink = Arc::new(RecordingSink::default());
        let controller = RunController::new(
            workers_config(20, 4),
            RunParts {
                executor: RequestExecutor::new(
                    Arc::new(StaticBuilder::default()),
                    sender.clone(),
                    Duration::from_secs(1),
                ),
                resources: Arc::new(StaticResources { missing: None }),
                progress: Arc::new(RecordingProgress::default()),
                stop_conditions: Vec::new(),
                sinks: vec![sink.clone()],
            },
        );

        match controller.run().await {
            Err(AppError::Run(RunError::WorkerFailed { .. })) => {}
            Err(err) => return Err(format!("Unexpected error: {}", err)),
            Ok(report) => return Err(format!("Crash must surface as an error: {:?}", report)),
        }
        if controller.lifecycle().state() != RunState::Finished {
            return Err(format!(
                "Run must still finish, got {:?}",
                controller.lifecycle().state()
            ));
        }

        let reports = sink.reports();
        let [report] = reports.as_slice() else {
            return Err(format!("Expected one report, got {}", reports.len()));
        };
        if report.stop_reason != Some(StopReason::WorkerFailed) || report.completed() {
            return Err(format!("Unexpected stop fields: {:?}", report));
        }
        let sent = sender.calls.load(Ordering::SeqCst);
        if report.total_requests < 3 || report.total_requests != sent.saturating_sub(1) {
            return Err(format!("Folded {} of {} sends", report.total_requests, sent));
        }
        Ok(())
    })
}

#[test]
fn per_minute_rate_is_not_derived_from_rounded_per_second() -> Result<(), String> {
    let mut stats = crate::aggregator::RunStats::new(chrono::Utc::now());
    for id in 0..7_u64 {
        stats.fold(&crate::outcome::Outcome::success(
            id,
            200,
            Duration::from_millis(5),
        ));
    }
    let report = FinalReport::from_stats(&stats, Duration::from_secs(3), Some(7), None);
    if report.requests_per_second_x100 != 233 || report.requests_per_minute_x100 != 14_000 {
        return Err(format!(
            "Unexpected rates: {} / {}",
            report.requests_per_second_x100, report.requests_per_minute_x100
        ));
    }
    Ok(())
}
