//! Forward transform: raw table to encoded table plus manifest.
//!
//! Fields are processed in schema order. Each field yields one or more
//! encoded columns, their generation directives and, when the transform is
//! not the identity, a manifest entry. The abnormal-value sweep runs over
//! every emitted column before the table is assembled.

use polars::prelude::{Column, DataFrame, IntoColumn};
use serde::Serialize;
use trace_model::{
    AddressFamily, ChangedField, ChangedFieldsMap, DerivedColumn, Directive, Encoding, FieldSpec,
    GenerationConfig, PrimitiveType, Schema, TimestampKind, ValueFormat,
};
use trace_ingest::{parse_f64, parse_i64};

use crate::abnormal::AbnormalPolicy;
use crate::address::encode_address;
use crate::column::{ColumnValues, EncodedColumn, float_cells, integer_cells, text_cells};
use crate::composite::{NO, YES, attribute_flags, lookup_value, split_values};
use crate::error::{CellError, CodecError, Result};
use crate::timestamp::{is_valid_format, parse_ticks};

/// Per-field encode statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldStats {
    pub field: String,
    pub primitive: PrimitiveType,
    pub columns: usize,
    /// Cells replaced by the abnormal-value sentinel.
    pub substituted: usize,
}

/// Result of one encode run.
#[derive(Debug, Clone)]
pub struct EncodeOutput {
    pub table: DataFrame,
    pub generation: GenerationConfig,
    pub changed: ChangedFieldsMap,
    pub encoded_columns: Vec<String>,
    pub stats: Vec<FieldStats>,
}

/// What a single field contributes to the encode output.
struct FieldEncoding {
    columns: Vec<EncodedColumn>,
    directives: Vec<Directive>,
    change: Option<ChangedField>,
}

impl FieldEncoding {
    fn scalar(column: EncodedColumn, directive: Directive) -> Self {
        Self {
            columns: vec![column],
            directives: vec![directive],
            change: None,
        }
    }

    fn with_change(mut self, change: ChangedField) -> Self {
        self.change = Some(change);
        self
    }
}

/// Encodes `table` according to `schema`.
///
/// Fails on a config/dataset mismatch or on a non-abnormal address or
/// timestamp literal that cannot be parsed; no partial output is produced.
pub fn encode(schema: &Schema, table: &DataFrame) -> Result<EncodeOutput> {
    let mut columns: Vec<Column> = Vec::with_capacity(schema.len());
    let mut generation = GenerationConfig::default();
    let mut changed = ChangedFieldsMap::new();
    let mut encoded_columns = Vec::with_capacity(schema.len());
    let mut stats = Vec::with_capacity(schema.len());

    for field in schema.fields() {
        let encoding = encode_field(table, field)?;
        let policy = AbnormalPolicy::for_field(field);

        let mut substituted = 0;
        let column_count = encoding.columns.len();
        for mut column in encoding.columns {
            substituted += policy.sweep(&mut column);
            encoded_columns.push(column.name.clone());
            columns.push(column.into_series().into_column());
        }
        for directive in encoding.directives {
            generation.push(field.role, directive);
        }
        if let Some(change) = encoding.change {
            changed.insert(field.name.clone(), change);
        }

        tracing::debug!(
            field = %field.name,
            primitive = %field.primitive,
            columns = column_count,
            substituted,
            "encoded field"
        );
        stats.push(FieldStats {
            field: field.name.clone(),
            primitive: field.primitive,
            columns: column_count,
            substituted,
        });
    }

    let table = DataFrame::new(columns)?;
    Ok(EncodeOutput {
        table,
        generation,
        changed,
        encoded_columns,
        stats,
    })
}

/// Dispatches a field to the transform for its primitive type.
fn encode_field(df: &DataFrame, field: &FieldSpec) -> Result<FieldEncoding> {
    match field.primitive {
        PrimitiveType::Integer => encode_integer(df, field),
        PrimitiveType::String => encode_string(df, field),
        PrimitiveType::Float => encode_float(df, field),
        PrimitiveType::Timestamp => encode_timestamp(df, field),
        PrimitiveType::Ipv4 => encode_ip(df, field, AddressFamily::V4),
        PrimitiveType::Ipv6 => encode_ip(df, field, AddressFamily::V6),
        PrimitiveType::ListAttributes => encode_list_attributes(df, field),
        PrimitiveType::ListValues => encode_list_values(df, field),
    }
}

fn encode_integer(df: &DataFrame, field: &FieldSpec) -> Result<FieldEncoding> {
    let values = integer_cells(df, &field.name)?;
    Ok(FieldEncoding::scalar(
        EncodedColumn::new(&field.to, ValueFormat::Numeric, ColumnValues::Integer(values)),
        Directive::from_encoding(&field.to, field.encoding, field.normalization),
    ))
}

fn encode_string(df: &DataFrame, field: &FieldSpec) -> Result<FieldEncoding> {
    let values = text_cells(df, &field.name)?;
    Ok(FieldEncoding::scalar(
        EncodedColumn::new(&field.to, ValueFormat::Text, ColumnValues::Text(values)),
        Directive::categorical(&field.to),
    ))
}

fn encode_float(df: &DataFrame, field: &FieldSpec) -> Result<FieldEncoding> {
    let values = float_cells(df, &field.name)?;
    Ok(FieldEncoding::scalar(
        EncodedColumn::new(&field.to, ValueFormat::Numeric, ColumnValues::Float(values)),
        Directive::float(&field.to, field.normalization),
    ))
}

fn encode_timestamp(df: &DataFrame, field: &FieldSpec) -> Result<FieldEncoding> {
    let directive = Directive::interarrival(&field.to);
    let time_format = match (field.timestamp_kind, field.time_format.as_deref()) {
        (TimestampKind::Unprocessed, Some(format)) => format,
        _ => {
            let values = integer_cells(df, &field.name)?;
            return Ok(FieldEncoding::scalar(
                EncodedColumn::new(&field.to, ValueFormat::Numeric, ColumnValues::Integer(values)),
                directive,
            ));
        }
    };
    if !is_valid_format(time_format) {
        return Err(CodecError::InvalidTimeFormat {
            field: field.name.clone(),
            format: time_format.to_string(),
        });
    }

    let policy = AbnormalPolicy::for_field(field);
    let cells = text_cells(df, &field.name)?;
    let mut ticks = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        if policy.is_abnormal_text(cell.as_deref()) {
            ticks.push(None);
            continue;
        }
        let value = cell.as_deref().unwrap_or_default();
        let tick = parse_ticks(value, time_format).ok_or_else(|| {
            CodecError::EncodeCell(CellError::new(
                &field.name,
                row,
                value,
                format!("does not match time format '{time_format}'"),
            ))
        })?;
        ticks.push(Some(tick));
    }

    Ok(FieldEncoding::scalar(
        EncodedColumn::new(&field.to, ValueFormat::Numeric, ColumnValues::Integer(ticks)),
        directive,
    )
    .with_change(ChangedField::Timestamp {
        time_format: time_format.to_string(),
    }))
}

fn encode_ip(df: &DataFrame, field: &FieldSpec, family: AddressFamily) -> Result<FieldEncoding> {
    let policy = AbnormalPolicy::for_field(field);
    let cells = text_cells(df, &field.name)?;
    let mut addresses = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        if policy.is_abnormal_text(cell.as_deref()) {
            addresses.push(None);
            continue;
        }
        let value = cell.as_deref().unwrap_or_default();
        let address = encode_address(value, family).ok_or_else(|| {
            CodecError::EncodeCell(CellError::new(
                &field.name,
                row,
                value,
                format!("not an {family} address"),
            ))
        })?;
        addresses.push(Some(address));
    }

    // IPv6 integers exceed i64 and travel as decimal text.
    let values = match family {
        AddressFamily::V4 => ColumnValues::Integer(
            addresses
                .into_iter()
                .map(|a| a.and_then(|v| i64::try_from(v).ok()))
                .collect(),
        ),
        AddressFamily::V6 => ColumnValues::Text(
            addresses
                .into_iter()
                .map(|a| a.map(|v| v.to_string()))
                .collect(),
        ),
    };

    Ok(FieldEncoding::scalar(
        EncodedColumn::new(&field.to, ValueFormat::Numeric, values),
        Directive::bit(&field.to, family.bits()),
    )
    .with_change(ChangedField::Address { family }))
}

fn encode_list_attributes(df: &DataFrame, field: &FieldSpec) -> Result<FieldEncoding> {
    let policy = AbnormalPolicy::for_field(field);
    let delimiter = field.delimiter.as_deref().unwrap_or(",");
    let labels: Vec<&str> = field.keys.iter().map(|key| key.label.as_str()).collect();
    let cells = text_cells(df, &field.name)?;

    let mut indicators: Vec<Vec<Option<String>>> =
        vec![Vec::with_capacity(cells.len()); labels.len()];
    for cell in &cells {
        let flags = if policy.is_abnormal_text(cell.as_deref()) {
            vec![false; labels.len()]
        } else {
            attribute_flags(cell.as_deref().unwrap_or_default(), delimiter, &labels)
        };
        for (column, set) in indicators.iter_mut().zip(flags) {
            column.push(Some(if set { YES } else { NO }.to_string()));
        }
    }

    let mut encoding = FieldEncoding {
        columns: Vec::with_capacity(labels.len()),
        directives: Vec::with_capacity(labels.len()),
        change: None,
    };
    let mut new_columns = Vec::with_capacity(labels.len());
    for (label, values) in labels.iter().zip(indicators) {
        let name = field.derived_column(label);
        encoding.directives.push(Directive::categorical(&name));
        new_columns.push(DerivedColumn {
            column: name.clone(),
            origin: (*label).to_string(),
            encoding: Encoding::Categorical,
        });
        encoding
            .columns
            .push(EncodedColumn::new(name, ValueFormat::Text, ColumnValues::Text(values)));
    }

    Ok(encoding.with_change(ChangedField::ListAttributes {
        delimiter: delimiter.to_string(),
        new_columns,
    }))
}

fn encode_list_values(df: &DataFrame, field: &FieldSpec) -> Result<FieldEncoding> {
    let policy = AbnormalPolicy::for_field(field);
    let delimiter = field.delimiter.as_deref().unwrap_or("=");
    let cells = text_cells(df, &field.name)?;

    let parsed: Vec<Vec<(&str, &str)>> = cells
        .iter()
        .map(|cell| match cell.as_deref() {
            Some(text) if !policy.is_abnormal_text(Some(text)) => split_values(text, delimiter),
            _ => Vec::new(),
        })
        .collect();

    let mut encoding = FieldEncoding {
        columns: Vec::with_capacity(field.keys.len()),
        directives: Vec::with_capacity(field.keys.len()),
        change: None,
    };
    let mut new_columns = Vec::with_capacity(field.keys.len());
    for key in &field.keys {
        let name = field.derived_column(&key.label);
        let raw: Vec<Option<&str>> = parsed
            .iter()
            .map(|pairs| lookup_value(pairs, &key.label).filter(|v| !v.is_empty()))
            .collect();

        let values = match key.encoding {
            Encoding::Categorical => {
                ColumnValues::Text(raw.iter().map(|v| v.map(str::to_string)).collect())
            }
            Encoding::Float => ColumnValues::Float(typed_values(&name, &raw, parse_f64)?),
            _ => ColumnValues::Integer(typed_values(&name, &raw, parse_i64)?),
        };

        encoding
            .directives
            .push(Directive::from_encoding(&name, key.encoding, field.normalization));
        new_columns.push(DerivedColumn {
            column: name.clone(),
            origin: key.label.clone(),
            encoding: key.encoding,
        });
        encoding
            .columns
            .push(EncodedColumn::new(name, key.value_format(), values));
    }

    Ok(encoding.with_change(ChangedField::ListValues {
        delimiter: delimiter.to_string(),
        new_columns,
    }))
}

/// Parses list values for a numeric key. `-1` passes through for the sweep.
fn typed_values<T>(
    column: &str,
    raw: &[Option<&str>],
    parse: fn(&str) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    raw.iter()
        .enumerate()
        .map(|(row, value)| match value {
            None => Ok(None),
            Some(text) => parse(text).map(Some).ok_or_else(|| {
                CodecError::EncodeCell(CellError::new(column, row, text, "value is not numeric"))
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{AnyValue, df};
    use serde_json::json;
    use trace_ingest::any_to_string;
    use trace_model::{RawField, Role};

    fn field(role: Role, value: serde_json::Value) -> FieldSpec {
        let raw: RawField = serde_json::from_value(value).unwrap();
        FieldSpec::from_raw(role, raw).unwrap()
    }

    fn cell(df: &DataFrame, column: &str, row: usize) -> String {
        any_to_string(df.column(column).unwrap().get(row).unwrap_or(AnyValue::Null))
    }

    #[test]
    fn test_ip_encodes_to_integer() {
        let schema = Schema::from_fields(vec![field(
            Role::Metadata,
            json!({"name": "srcip", "format": "IP", "type": "IPv4", "encoding": "bit"}),
        )])
        .unwrap();
        let df = df! { "srcip" => &[Some("192.168.0.1"), Some("0"), None, Some("-1")] }.unwrap();
        let output = encode(&schema, &df).unwrap();
        assert_eq!(cell(&output.table, "srcip", 0), "3232235521");
        assert_eq!(cell(&output.table, "srcip", 1), "0");
        assert_eq!(cell(&output.table, "srcip", 2), "0");
        assert_eq!(cell(&output.table, "srcip", 3), "0");
        assert_eq!(
            output.changed.get("srcip"),
            Some(&ChangedField::Address {
                family: AddressFamily::V4
            })
        );
        assert_eq!(output.stats[0].substituted, 2);
    }

    #[test]
    fn test_malformed_ip_is_fatal() {
        let schema = Schema::from_fields(vec![field(
            Role::Metadata,
            json!({"name": "srcip", "format": "IP", "type": "IPv4"}),
        )])
        .unwrap();
        let df = df! { "srcip" => &["10.0.0.1", "10.0.0"] }.unwrap();
        let err = encode(&schema, &df).unwrap_err();
        assert!(matches!(err, CodecError::EncodeCell(CellError { row: 1, .. })));
    }

    #[test]
    fn test_list_attributes_explode() {
        let schema = Schema::from_fields(vec![field(
            Role::Timeseries,
            json!({
                "name": "flags",
                "format": "list",
                "encoding": "list_attributes",
                "names": ["A", "B", "C"],
                "delimiter": ","
            }),
        )])
        .unwrap();
        let df = df! { "flags" => &[Some("A,B"), None] }.unwrap();
        let output = encode(&schema, &df).unwrap();
        assert_eq!(output.encoded_columns, vec!["flags_A", "flags_B", "flags_C"]);
        assert_eq!(cell(&output.table, "flags_A", 0), "Yes");
        assert_eq!(cell(&output.table, "flags_B", 0), "Yes");
        assert_eq!(cell(&output.table, "flags_C", 0), "No");
        assert_eq!(cell(&output.table, "flags_A", 1), "No");
        assert_eq!(output.generation.timeseries.len(), 3);
    }

    #[test]
    fn test_list_values_split_with_sentinels() {
        let schema = Schema::from_fields(vec![field(
            Role::Timeseries,
            json!({
                "name": "extra",
                "format": "list",
                "encoding": "list_values",
                "names": {"ttl": "bit", "service": "categorical"},
                "delimiter": "="
            }),
        )])
        .unwrap();
        let df = df! { "extra" => &["ttl = 64\nservice = dns", "ttl = 32"] }.unwrap();
        let output = encode(&schema, &df).unwrap();
        assert_eq!(cell(&output.table, "extra_ttl", 0), "64");
        assert_eq!(cell(&output.table, "extra_service", 0), "dns");
        assert_eq!(cell(&output.table, "extra_ttl", 1), "32");
        assert_eq!(cell(&output.table, "extra_service", 1), "unavailable");
    }

    #[test]
    fn test_fractional_integer_is_fatal() {
        let schema = Schema::from_fields(vec![field(
            Role::Timeseries,
            json!({"name": "dur", "format": "integer", "encoding": "bit"}),
        )])
        .unwrap();
        let df = df! { "dur" => &[7.0f64, 3.5] }.unwrap();
        let err = encode(&schema, &df).unwrap_err();
        let CodecError::EncodeCell(cell_error) = err else {
            panic!("expected EncodeCell, got {err:?}");
        };
        assert_eq!(cell_error.column, "dur");
        assert_eq!(cell_error.row, 1);
        assert_eq!(cell_error.value, "3.5");
    }

    #[test]
    fn test_integral_floats_encode_as_integers() {
        let schema = Schema::from_fields(vec![field(
            Role::Timeseries,
            json!({"name": "dur", "format": "integer", "encoding": "bit"}),
        )])
        .unwrap();
        let df = df! { "dur" => &[Some(7.0f64), None, Some(-1.0), Some(f64::NAN)] }.unwrap();
        let output = encode(&schema, &df).unwrap();
        assert_eq!(cell(&output.table, "dur", 0), "7");
        assert_eq!(cell(&output.table, "dur", 1), "0");
        assert_eq!(cell(&output.table, "dur", 2), "0");
        assert_eq!(cell(&output.table, "dur", 3), "0");
        assert_eq!(output.stats[0].substituted, 3);
    }

    #[test]
    fn test_abnormal_list_values_cell_fills_every_key() {
        let schema = Schema::from_fields(vec![field(
            Role::Timeseries,
            json!({
                "name": "extra",
                "format": "list",
                "encoding": "list_values",
                "names": {"ttl": "bit", "service": "categorical"},
                "delimiter": "="
            }),
        )])
        .unwrap();
        let df = df! {
            "extra" => &[None, Some("-1"), Some(""), Some("ttl = 64\nservice = dns")],
        }
        .unwrap();
        let output = encode(&schema, &df).unwrap();
        for row in 0..3 {
            assert_eq!(cell(&output.table, "extra_ttl", row), "0", "row {row}");
            assert_eq!(
                cell(&output.table, "extra_service", row),
                "unavailable",
                "row {row}"
            );
        }
        assert_eq!(cell(&output.table, "extra_ttl", 3), "64");
        assert_eq!(cell(&output.table, "extra_service", 3), "dns");
    }

    #[test]
    fn test_encoded_table_has_only_declared_columns() {
        let schema = Schema::from_fields(vec![
            field(Role::Metadata, json!({"name": "proto", "format": "string"})),
            field(Role::Timeseries, json!({"name": "bytes", "to": "octets", "format": "float"})),
        ])
        .unwrap();
        let df = df! {
            "bytes" => &[1.5f64, -1.0],
            "noise" => &["x", "y"],
            "proto" => &["tcp", ""],
        }
        .unwrap();
        let output = encode(&schema, &df).unwrap();
        let names: Vec<&str> = output
            .table
            .get_column_names()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(names, vec!["proto", "octets"]);
        assert_eq!(cell(&output.table, "proto", 1), "unavailable");
        assert_eq!(cell(&output.table, "octets", 1), "0");
        assert!(output.changed.is_empty());
    }
}
