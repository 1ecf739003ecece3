//! Request outcome model and the single classification boundary.
use std::time::Duration;

use crate::error::PayloadError;

pub(crate) const TIMEOUT_MESSAGE: &str = "Request timeout";
pub(crate) const NO_RESPONSE_MESSAGE: &str = "No response received";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    HttpError,
    Timeout,
    NoResponse,
    RequestSetupError,
}

impl OutcomeKind {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, OutcomeKind::Success)
    }
}

/// Transport-level failure categories reported by a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    Connect,
    Request,
    Body,
    Redirect,
    Other,
}

/// What a sender observed for one dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawResult {
    HttpResponse { status: u16 },
    TransportFailure(TransportFailureKind),
    Aborted,
}

/// Classified result of one request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub request_id: u64,
    pub kind: OutcomeKind,
    pub status_code: Option<u16>,
    pub elapsed: Duration,
    pub error_message: Option<String>,
}

impl Outcome {
    #[must_use]
    pub const fn success(request_id: u64, status_code: u16, elapsed: Duration) -> Self {
        Self {
            request_id,
            kind: OutcomeKind::Success,
            status_code: Some(status_code),
            elapsed,
            error_message: None,
        }
    }

    #[must_use]
    pub fn setup_error(request_id: u64, error: &PayloadError) -> Self {
        Self {
            request_id,
            kind: OutcomeKind::RequestSetupError,
            status_code: None,
            elapsed: Duration::ZERO,
            error_message: Some(error.to_string()),
        }
    }
}

/// Maps a raw sender result onto exactly one outcome kind.
#[must_use]
pub fn classify(request_id: u64, raw: RawResult, elapsed: Duration) -> Outcome {
    match raw {
        RawResult::HttpResponse { status } if (200..=299).contains(&status) => {
            Outcome::success(request_id, status, elapsed)
        }
        RawResult::HttpResponse { status } => Outcome {
            request_id,
            kind: OutcomeKind::HttpError,
            status_code: Some(status),
            elapsed,
            error_message: Some(format!("HTTP error: {}", status)),
        },
        RawResult::Aborted => Outcome {
            request_id,
            kind: OutcomeKind::Timeout,
            status_code: None,
            elapsed,
            error_message: Some(TIMEOUT_MESSAGE.to_owned()),
        },
        RawResult::TransportFailure(_) => Outcome {
            request_id,
            kind: OutcomeKind::NoResponse,
            status_code: None,
            elapsed,
            error_message: Some(NO_RESPONSE_MESSAGE.to_owned()),
        },
    }
}

/// Classifies the full attempt, including failures before dispatch.
#[must_use]
pub fn classify_attempt(
    request_id: u64,
    attempt: Result<RawResult, PayloadError>,
    elapsed: Duration,
) -> Outcome {
    match attempt {
        Ok(raw) => classify(request_id, raw, elapsed),
        Err(err) => Outcome::setup_error(request_id, &err),
    }
}
