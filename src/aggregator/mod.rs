//! Single-consumer fold of request outcomes into run statistics.
mod collector;
mod stats;


pub use collector::{Aggregator, AggregatorHooks};
pub use stats::RunStats;
