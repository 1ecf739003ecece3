use clap::Parser;

use crate::error::{AppError, AppResult};

use super::DocstressArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<DocstressArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    DocstressArgs::try_parse_from(args).map_err(AppError::from)
}
