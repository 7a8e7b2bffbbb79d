//! Error types for loading, preprocessing, training and persistence.

use thiserror::Error;

/// Error type shared by every stage of the housing pipeline.
///
/// No stage retries internally; each failure is surfaced to the immediate caller.
#[derive(Debug, Error)]
pub enum HousingError {
    /// The data file or artifact could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader failed to tokenize the input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A cell that is neither numeric nor a missing-value marker.
    #[error("Parse error at line {line}, column '{column}': cannot read '{value}' as a number")]
    Parse {
        line: usize,
        column: String,
        value: String,
    },

    /// Column count, names or order disagree with the expected schema.
    #[error("Schema mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: String, got: String },

    /// A column name that is not part of the schema.
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// A stratum is too small to be split into train and test rows.
    #[error(
        "Insufficient strata: value {value} of '{column}' has {count} member(s), at least 2 required"
    )]
    InsufficientStrata {
        column: String,
        value: String,
        count: usize,
    },

    /// The requested number of cross-validation folds is out of range.
    #[error("Invalid fold count: k = {k} must satisfy 2 <= k <= {n_samples}")]
    InvalidFoldCount { k: usize, n_samples: usize },

    /// A column with no observed values cannot provide a fill statistic.
    #[error("Empty column: '{name}' (index {index}) has no observed values")]
    EmptyColumn { index: usize, name: String },

    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A component was used before it was fitted or installed.
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Row or column counts of matrices/vectors disagree.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Invalid hyperparameter or argument value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input values outside their accepted domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Encoding parameters into bytes failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The artifact could not be decoded into a pipeline and regressor.
    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// The artifact was written by a newer, incompatible format.
    #[error("Version mismatch: artifact format {found}, supported up to {supported}")]
    VersionMismatch { found: u32, supported: u32 },

    /// Invalid or unreadable training configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HousingError {
    pub(crate) fn shape(expected: impl ToString, got: impl ToString) -> Self {
        HousingError::ShapeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    pub(crate) fn schema(expected: impl ToString, got: impl ToString) -> Self {
        HousingError::SchemaMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

impl From<serde_json::Error> for HousingError {
    fn from(err: serde_json::Error) -> Self {
        HousingError::Config(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HousingError>;
