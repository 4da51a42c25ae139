//! Reverse transform: generated table plus manifest to final table.
//!
//! The manifest is validated against the generated table before any cell is
//! touched. Each field is then reconstructed under its original name, rows
//! are sorted by the metadata tuple and a `flow_id` column is appended.

use std::collections::BTreeSet;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use trace_model::{
    AddressFamily, ChangedField, ChangedFieldsMap, CodecConfig, DerivedColumn, FLOW_ID_COLUMN,
    FieldSpec, PrimitiveType, Role, Schema, TimestampKind, ValueFormat,
};
use trace_ingest::parse_i64;

use crate::abnormal::is_sentinel;
use crate::address::{decode_address, parse_address_integer};
use crate::column::text_cells;
use crate::composite::{NO, YES, collapse_attributes, join_values};
use crate::error::{CellError, CodecError, Result};
use crate::flow::assign_flow_ids;
use crate::timestamp::format_ticks;

/// What to do with generated cells that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellErrorPolicy {
    /// Abort the decode and report every failing cell.
    #[default]
    Fail,
    /// Null the failing cells and report them with the table.
    Null,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub on_cell_error: CellErrorPolicy,
}

/// Everything the decoder needs from an encode run's output config.
#[derive(Debug, Clone)]
pub struct DecodeManifest {
    pub changed: ChangedFieldsMap,
    pub schema: Schema,
    pub encoded_columns: Option<Vec<String>>,
}

impl DecodeManifest {
    /// Reads the manifest from an output config.
    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        let changed = config
            .changed_fields()
            .cloned()
            .ok_or(CodecError::MissingManifest)?;
        let schema = Schema::from_fields(config.fields().to_vec())?;
        Ok(Self {
            changed,
            schema,
            encoded_columns: config.encoded_columns().map(<[String]>::to_vec),
        })
    }
}

/// Result of one decode run.
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    pub table: DataFrame,
    /// Cells nulled under [`CellErrorPolicy::Null`].
    pub cell_errors: Vec<CellError>,
    pub flow_count: usize,
    /// Generated columns not referenced by the manifest.
    pub ignored_columns: Vec<String>,
}

/// Decodes a generated table.
pub fn decode(
    manifest: &DecodeManifest,
    generated: &DataFrame,
    options: &DecodeOptions,
) -> Result<DecodeOutput> {
    let ignored_columns = validate(manifest, generated)?;
    for column in &ignored_columns {
        tracing::warn!(column = %column, "ignoring generated column not in manifest");
    }

    let rows = generated.height();
    let mut errors = Vec::new();
    let mut decoded: Vec<(&FieldSpec, Vec<Option<String>>)> =
        Vec::with_capacity(manifest.schema.len());

    for field in manifest.schema.fields() {
        let cells = match manifest.changed.get(&field.name) {
            None => text_cells(generated, &field.to)?,
            Some(ChangedField::Address { family }) => {
                decode_addresses(generated, &field.to, *family, &mut errors)?
            }
            Some(ChangedField::Timestamp { time_format }) => {
                decode_timestamps(generated, &field.to, time_format, &mut errors)?
            }
            Some(ChangedField::ListAttributes {
                delimiter,
                new_columns,
            }) => decode_list_attributes(generated, new_columns, delimiter, rows, &mut errors)?,
            Some(ChangedField::ListValues {
                delimiter,
                new_columns,
            }) => decode_list_values(generated, new_columns, delimiter, rows)?,
        };
        tracing::debug!(field = %field.name, rows = cells.len(), "decoded field");
        decoded.push((field, cells));
    }

    if !errors.is_empty() {
        match options.on_cell_error {
            CellErrorPolicy::Fail => return Err(CodecError::DecodeCells { errors }),
            CellErrorPolicy::Null => {
                tracing::warn!(count = errors.len(), "nulled cells that failed to decode");
            }
        }
    }

    let keys: Vec<Vec<Option<String>>> = decoded
        .iter()
        .filter(|(field, _)| field.role == Role::Metadata)
        .map(|(_, cells)| cells.clone())
        .collect();
    let flows = assign_flow_ids(&keys, rows);

    let mut columns: Vec<Column> = Vec::with_capacity(decoded.len() + 1);
    for (field, cells) in decoded {
        let sorted: Vec<Option<String>> = flows
            .order
            .iter()
            .map(|&row| cells.get(row).cloned().flatten())
            .collect();
        columns.push(Series::new(field.name.as_str().into(), sorted).into_column());
    }
    columns.push(Series::new(FLOW_ID_COLUMN.into(), flows.ids.clone()).into_column());

    let table = DataFrame::new(columns)?;
    Ok(DecodeOutput {
        table,
        cell_errors: errors,
        flow_count: flows.flow_count(),
        ignored_columns,
    })
}

/// Checks the manifest against the schema and the generated table.
///
/// Returns the generated columns the manifest does not reference.
fn validate(manifest: &DecodeManifest, generated: &DataFrame) -> Result<Vec<String>> {
    for (name, change) in manifest.changed.iter() {
        let field = manifest
            .schema
            .field(name)
            .ok_or_else(|| mismatch(name, "manifest entry names no declared field"))?;
        if !change_matches(field, change) {
            return Err(mismatch(
                name,
                format!(
                    "'{}' transform does not apply to a {} field",
                    change.kind(),
                    field.primitive
                ),
            ));
        }
    }

    let present: BTreeSet<&str> = generated
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    let mut referenced = BTreeSet::new();
    for field in manifest.schema.fields() {
        let change = manifest.changed.get(&field.name);
        if change.is_none() && requires_change(field) {
            return Err(mismatch(&field.name, "no manifest entry for transformed field"));
        }
        let columns: Vec<String> = match change {
            Some(change) if field.primitive.is_composite() => change
                .derived_columns()
                .iter()
                .map(|derived| derived.column.clone())
                .collect(),
            _ => vec![field.to.clone()],
        };
        for column in columns {
            if !present.contains(column.as_str()) {
                return Err(mismatch(&column, "missing from generated table"));
            }
            referenced.insert(column);
        }
    }

    if let Some(encoded) = &manifest.encoded_columns {
        for column in encoded {
            if !present.contains(column.as_str()) {
                return Err(mismatch(column, "encoded column missing from generated table"));
            }
            if !referenced.contains(column) {
                return Err(mismatch(column, "encoded column not covered by the manifest"));
            }
        }
    }

    Ok(present
        .into_iter()
        .filter(|name| !referenced.contains(*name))
        .map(str::to_string)
        .collect())
}

fn change_matches(field: &FieldSpec, change: &ChangedField) -> bool {
    match change {
        ChangedField::Address { family } => field.address_family() == Some(*family),
        ChangedField::Timestamp { .. } => field.primitive == PrimitiveType::Timestamp,
        ChangedField::ListAttributes { .. } => field.primitive == PrimitiveType::ListAttributes,
        ChangedField::ListValues { .. } => field.primitive == PrimitiveType::ListValues,
    }
}

fn requires_change(field: &FieldSpec) -> bool {
    match field.primitive {
        PrimitiveType::Ipv4
        | PrimitiveType::Ipv6
        | PrimitiveType::ListAttributes
        | PrimitiveType::ListValues => true,
        PrimitiveType::Timestamp => field.timestamp_kind == TimestampKind::Unprocessed,
        PrimitiveType::Integer | PrimitiveType::String | PrimitiveType::Float => false,
    }
}

fn mismatch(column: &str, reason: impl Into<String>) -> CodecError {
    CodecError::ManifestMismatch {
        column: column.to_string(),
        reason: reason.into(),
    }
}

fn decode_addresses(
    df: &DataFrame,
    column: &str,
    family: AddressFamily,
    errors: &mut Vec<CellError>,
) -> Result<Vec<Option<String>>> {
    let cells = text_cells(df, column)?;
    Ok(cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| {
            let text = cell?;
            if is_sentinel(&text, ValueFormat::Numeric) {
                return Some(text);
            }
            let Some(value) = parse_address_integer(&text) else {
                errors.push(CellError::new(column, row, &text, "not an address integer"));
                return None;
            };
            let literal = decode_address(value, family);
            if literal.is_none() {
                errors.push(CellError::new(
                    column,
                    row,
                    &text,
                    format!("out of range for {family}"),
                ));
            }
            literal
        })
        .collect())
}

fn decode_timestamps(
    df: &DataFrame,
    column: &str,
    time_format: &str,
    errors: &mut Vec<CellError>,
) -> Result<Vec<Option<String>>> {
    let cells = text_cells(df, column)?;
    Ok(cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| {
            let text = cell?;
            if is_sentinel(&text, ValueFormat::Numeric) {
                return Some(text);
            }
            let Some(ticks) = parse_i64(&text) else {
                errors.push(CellError::new(column, row, &text, "not a tick integer"));
                return None;
            };
            let formatted = format_ticks(ticks, time_format);
            if formatted.is_none() {
                errors.push(CellError::new(column, row, &text, "tick out of range"));
            }
            formatted
        })
        .collect())
}

fn decode_list_attributes(
    df: &DataFrame,
    derived: &[DerivedColumn],
    delimiter: &str,
    rows: usize,
    errors: &mut Vec<CellError>,
) -> Result<Vec<Option<String>>> {
    let mut flags = vec![Vec::with_capacity(derived.len()); rows];
    for column in derived {
        let cells = text_cells(df, &column.column)?;
        for (row, cell) in cells.into_iter().enumerate() {
            let set = match cell.as_deref() {
                Some(YES) => true,
                None | Some(NO) => false,
                Some(text) if is_sentinel(text, ValueFormat::Text) => false,
                Some(text) => {
                    errors.push(CellError::new(
                        &column.column,
                        row,
                        text,
                        "indicator is neither Yes nor No",
                    ));
                    false
                }
            };
            if let Some(row_flags) = flags.get_mut(row) {
                row_flags.push((column.origin.as_str(), set));
            }
        }
    }
    Ok(flags
        .into_iter()
        .map(|row_flags| Some(collapse_attributes(row_flags, delimiter)))
        .collect())
}

fn decode_list_values(
    df: &DataFrame,
    derived: &[DerivedColumn],
    delimiter: &str,
    rows: usize,
) -> Result<Vec<Option<String>>> {
    let mut pairs: Vec<Vec<(&str, String)>> = vec![Vec::with_capacity(derived.len()); rows];
    for column in derived {
        let cells = text_cells(df, &column.column)?;
        for (row, cell) in cells.into_iter().enumerate() {
            if let (Some(value), Some(row_pairs)) = (cell, pairs.get_mut(row)) {
                row_pairs.push((column.origin.as_str(), value));
            }
        }
    }
    Ok(pairs
        .iter()
        .map(|row_pairs| {
            Some(join_values(
                row_pairs.iter().map(|(key, value)| (*key, value.as_str())),
                delimiter,
            ))
        })
        .collect())
}
