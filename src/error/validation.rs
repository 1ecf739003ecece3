use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Missing URL (set --url or provide in config).")]
    MissingUrl,
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL is missing host.")]
    UrlMissingHost,
    #[error("Invalid form entry '{entry}'. Expected 'name=value' or 'name=@path'.")]
    InvalidFormEntryFormat { entry: String },
    #[error("Invalid form entry '{entry}'. Field name must not be empty.")]
    FormEntryNameEmpty { entry: String },
    #[error("Invalid form entry '{entry}'. File path must not be empty.")]
    FormEntryPathEmpty { entry: String },
    #[error("Multipart payload needs at least one --form field.")]
    MultipartWithoutFields,
    #[error("Inline JSON payload needs --attachment.")]
    InlineJsonWithoutAttachment,
    #[error("--until-stopped cannot be combined with --requests.")]
    RequestBudgetConflict,
    #[error("--until-stopped only works with --mode batch.")]
    UntilStoppedWithWorkers,
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
