//! Error types for encoding and decoding.

use std::fmt;

use polars::prelude::PolarsError;
use thiserror::Error;
use trace_ingest::IngestError;
use trace_model::ModelError;

/// A single cell that could not be transformed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CellError {
    pub column: String,
    /// Zero-based row index in the table being transformed.
    pub row: usize,
    pub value: String,
    pub reason: String,
}

impl CellError {
    pub fn new(column: &str, row: usize, value: &str, reason: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            row,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column '{}' row {}: {} (value '{}')",
            self.column, self.row, self.reason, self.value
        )
    }
}

/// Errors raised by the codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// A timestamp field carries a format string chrono cannot interpret.
    #[error("field '{field}': invalid time format '{format}'")]
    InvalidTimeFormat { field: String, format: String },

    /// A non-abnormal input cell could not be encoded.
    #[error("cannot encode {0}")]
    EncodeCell(CellError),

    /// Generated cells that could not be decoded.
    #[error("{} cell(s) failed to decode; first: {}", .errors.len(), first_error(.errors))]
    DecodeCells { errors: Vec<CellError> },

    /// The config being decoded was not produced by an encode run.
    #[error("config has no changed_fields manifest")]
    MissingManifest,

    /// Manifest and generated table do not belong together.
    #[error("manifest mismatch for '{column}': {reason}")]
    ManifestMismatch { column: String, reason: String },

    #[error("failed to serialize output config: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn first_error(errors: &[CellError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
