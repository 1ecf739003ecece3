//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod settings;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use cli::DocstressArgs;
pub use settings::{PayloadSettings, RunSettings};
pub use types::{FormFieldSpec, HttpMethod, PayloadKind, PositiveUsize, RunMode};

pub(crate) use defaults::DEFAULT_USER_AGENT;
