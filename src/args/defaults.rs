pub(crate) const DEFAULT_USER_AGENT: &str = concat!("docstress/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_REQUESTS: u64 = 100;
pub(crate) const DEFAULT_PROMPT: &str = "Summarize the attached document.";

/// One worker per available core, leaving one for the aggregator.
pub(crate) fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map_or(1, |count| count.get().saturating_sub(1))
        .max(1)
}
