//! Error types for field configuration.

use thiserror::Error;

use crate::enums::Role;

/// Errors raised while parsing or validating a field configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Config document is not valid JSON or does not match the expected shape.
    #[error("invalid config: {source}")]
    ConfigParse {
        #[source]
        source: serde_json::Error,
    },

    /// A required top-level section is missing or has the wrong type.
    #[error("config section '{section}' is missing or malformed")]
    MissingSection { section: String },

    /// A field entry in a role list could not be read.
    #[error("invalid field entry #{index} in '{role}': {source}")]
    FieldEntry {
        role: Role,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("field '{field}': unknown {key} '{value}'")]
    UnknownValue {
        field: String,
        key: &'static str,
        value: String,
    },

    /// Encoding not permitted for the declared format.
    #[error("field '{field}': encoding '{encoding}' is not valid for format '{format}'")]
    EncodingNotAllowed {
        field: String,
        encoding: String,
        format: String,
    },

    /// Required attribute missing for the declared format.
    #[error("field '{field}': missing required attribute '{attribute}'")]
    MissingAttribute {
        field: String,
        attribute: &'static str,
    },

    #[error("field '{field}': invalid '{attribute}': {reason}")]
    InvalidAttribute {
        field: String,
        attribute: &'static str,
        reason: String,
    },

    /// Timestamp format used outside the timestamp role.
    #[error("field '{field}': timestamp fields must be declared under 'timestamp', found in '{role}'")]
    TimestampOutsideRole { field: String, role: Role },

    #[error("only one timestamp field is supported, found '{first}' and '{second}'")]
    MultipleTimestampFields { first: String, second: String },

    /// Two fields (or derived columns) would share a name.
    #[error("duplicate column name '{column}'")]
    DuplicateColumn { column: String },

    /// A field uses a name the decoder reserves for its own output.
    #[error("column name '{column}' is reserved")]
    ReservedColumn { column: String },

    /// A declared field does not exist in the dataset.
    #[error("field '{field}' not found in dataset")]
    MissingColumn { field: String },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
