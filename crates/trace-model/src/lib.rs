//! Core types for trace field codecs.
//!
//! - [`CodecConfig`]: the JSON config document with its typed field view
//! - [`FieldSpec`] / [`Schema`]: validated per-column descriptions
//! - [`ChangedFieldsMap`]: what the encoder did, so the decoder can undo it
//! - [`GenerationConfig`]: per-column directives for the model trainer

pub mod config;
pub mod directive;
pub mod enums;
pub mod error;
pub mod field;
pub mod manifest;
pub mod schema;

pub use config::{CodecConfig, InputFormat, ProcessorToggles};
pub use directive::{Directive, DirectiveEncoding, DirectiveType, GenerationConfig};
pub use enums::{
    AddressFamily, Encoding, FieldFormat, Normalization, ObservedType, PrimitiveType, Role,
    StorageClass, TimestampKind, ValueFormat,
};
pub use error::{ModelError, Result};
pub use field::{CompositeKey, FieldSpec, RawField, derived_column_name};
pub use manifest::{ChangedField, ChangedFieldsMap, DerivedColumn};
pub use schema::{DroppedField, FLOW_ID_COLUMN, Schema};
