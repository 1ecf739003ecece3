//! Core library for the `docstress` CLI.
//!
//! A concurrent load-generation harness for document upload endpoints:
//! requests are dispatched in batches or over partitioned workers, every
//! response is classified into one outcome, and outcomes are folded by a
//! single aggregator into the final report.
pub mod aggregator;
pub mod args;
pub mod config;
pub mod controller;
pub mod distributor;
pub mod error;
pub mod executor;
pub mod http;
pub mod logger;
pub mod outcome;
pub mod payload;
pub mod progress;
pub mod shutdown;
pub mod sinks;

mod entry;

pub use entry::{run, run_load_test};
