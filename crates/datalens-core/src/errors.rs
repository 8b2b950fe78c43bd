use thiserror::Error;

/// Job-level configuration failure.
///
/// Raised before any data is read; aborts the whole job. Everything else in
/// the error model is scoped to a single file or a single rule and never
/// prevents the job from producing a full report.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The rule identifier is not present in the registry
    #[error("Unknown rule type '{0}'")]
    UnknownRuleType(String),

    /// Job contains no files to validate
    #[error("Job configuration contains no files")]
    EmptyJob,

    /// Generic malformed job configuration
    #[error("Invalid job configuration: {0}")]
    Invalid(String),
}

/// File-level load failure. Fails the file it belongs to, not the job.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The Arrow reader produced an error (malformed batch, bad cast)
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("File '{file}' is malformed: {reason}")]
    Malformed { file: String, reason: String },
}

/// Rule-scoped failure.
///
/// Caught at the dispatcher boundary and converted into a failed
/// `ValidationResult` with `failed_count = 1`; the remaining rules of the
/// file keep running.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("Parameter '{param}' is invalid: {reason}")]
    InvalidParameter { param: String, reason: String },

    /// A column the rule references is absent from the data
    #[error("Column '{0}' not found in data")]
    MissingField(String),

    /// A cross-file reference could not be resolved or built
    #[error("Reference '{reference}' unavailable: {reason}")]
    MissingReference { reference: String, reason: String },

    /// The rule needs a second pass but the source is single-pass only
    #[error("Rule requires a restartable source, but '{0}' is single-pass")]
    NotRestartable(String),

    /// Chunk retrieval failed mid-rule
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl RuleError {
    pub fn invalid_parameter(param: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}
