use std::path::PathBuf;

use thiserror::Error;

/// Why the admissions table could not be loaded. Always fatal for rendering.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("diagnosis code '{0}' appears more than once")]
    DuplicateCode(String),

    #[error("row {row}, column '{column}': {message}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        message: String,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}
