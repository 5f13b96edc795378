use std::io;

use crate::pipelines::text_classification::ColumnKind;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Issue Classifier Error
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A dataset or model file could not be read or written
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A dataset row could not be parsed
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    /// A dataset header is missing a column the record type requires
    #[error("dataset {path} is missing the required column {column:?}")]
    Schema {
        /// The dataset that was being read
        path: String,
        /// The missing column name
        column: String,
    },

    /// A prediction input does not satisfy the schema the model was trained with
    #[error("schema mismatch: input is missing the column {column:?}")]
    SchemaMismatch {
        /// The missing column name
        column: String,
    },

    /// A pipeline stage refers to a column that no earlier stage produced
    #[error("no column named {0:?} in the frame")]
    MissingColumn(String),

    /// A pipeline stage found a column of an unexpected kind
    #[error("column {column:?} is {found:?}, expected {expected:?}")]
    ColumnKind {
        /// The column name
        column: String,
        /// The kind the stage needs
        expected: ColumnKind,
        /// The kind the frame holds
        found: ColumnKind,
    },

    /// Column lengths disagree inside a frame
    #[error("column {column:?} has {found} rows, expected {expected}")]
    RowCount {
        /// The column name
        column: String,
        /// The number of rows of the frame
        expected: usize,
        /// The number of rows of the column
        found: usize,
    },

    /// Text normalization or pre-tokenization failed
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Fitting a stage failed
    #[error("training failed: {0}")]
    Training(String),

    /// Evaluation could not produce metrics
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// The model artifact could not be saved or loaded
    #[error("unable to record model: {0}")]
    Record(String),

    /// A configuration file could not be loaded
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<burn::record::RecorderError> for Error {
    fn from(err: burn::record::RecorderError) -> Self {
        Error::Record(err.to_string())
    }
}

impl From<burn::config::ConfigError> for Error {
    fn from(err: burn::config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
