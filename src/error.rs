//! Error types for the flowgate library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Empty or degenerate input: {0}")]
    EmptyOrDegenerateInput(String),

    #[error("Contour error: {0}")]
    ContourExtraction(String),

    #[error(
        "Internal inconsistency: cumulative count never reached {target} \
         (total {total}, histogram {}x{})",
        .shape.0,
        .shape.1
    )]
    InternalInconsistency {
        target: usize,
        total: usize,
        shape: (usize, usize),
    },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, GateError>;
