//! Polars value helpers.
//!
//! Trace transforms work cell-by-cell on text or numbers; these helpers pull
//! typed values out of `AnyValue` and classify column dtypes.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, DataFrame, DataType};
use trace_model::ObservedType;

use crate::error::{IngestError, Result};

/// Converts a Polars AnyValue to its text form. Null becomes the empty string.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Formats a float without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    if v.is_nan() {
        return String::new();
    }
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Converts an AnyValue to f64, returning None for null, NaN or non-numeric text.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    let v = match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    };
    v.filter(|v| !v.is_nan())
}

/// Converts an AnyValue to i64, returning None for null or non-integer values.
///
/// Floats are accepted when integral, since integer columns with gaps may be
/// read back as floats.
pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(i64::from(v)),
        AnyValue::Int16(v) => Some(i64::from(v)),
        AnyValue::Int32(v) => Some(i64::from(v)),
        AnyValue::Int64(v) => Some(v),
        AnyValue::UInt8(v) => Some(i64::from(v)),
        AnyValue::UInt16(v) => Some(i64::from(v)),
        AnyValue::UInt32(v) => Some(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).ok(),
        AnyValue::Float32(v) => integral(f64::from(v)),
        AnyValue::Float64(v) => integral(v),
        AnyValue::String(s) => parse_i64(s),
        AnyValue::StringOwned(s) => parse_i64(&s),
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e18 {
        Some(v as i64)
    } else {
        None
    }
}

/// Parses a string as f64, returning None for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        return None;
    }
    value.trim().parse::<f64>().ok()
}

/// Parses a string as i64, accepting integral float spellings such as `"80.0"`.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
}

/// Extracts a column as optional text cells; nulls stay `None`.
pub fn column_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name).map_err(|_| IngestError::ColumnNotFound {
        column: name.to_string(),
    })?;
    let mut cells = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = column.get(idx).unwrap_or(AnyValue::Null);
        cells.push(match value {
            AnyValue::Null => None,
            other => Some(any_to_string(other)),
        });
    }
    Ok(cells)
}

/// Reduces a polars dtype to the classes schema validation checks.
pub fn observed_type(dtype: &DataType) -> ObservedType {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ObservedType::Integer,
        DataType::Float32 | DataType::Float64 => ObservedType::Float,
        DataType::String => ObservedType::Text,
        DataType::Null => ObservedType::Null,
        _ => ObservedType::Other,
    }
}

/// Observed type of every column in the frame.
pub fn observed_types(df: &DataFrame) -> BTreeMap<String, ObservedType> {
    df.get_columns()
        .iter()
        .map(|col| {
            let observed = if col.null_count() == col.len() {
                ObservedType::Null
            } else {
                observed_type(col.dtype())
            };
            (col.name().to_string(), observed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    #[test]
    fn test_any_to_string_formats_numbers() {
        assert_eq!(any_to_string(AnyValue::Int64(-1)), "-1");
        assert_eq!(any_to_string(AnyValue::Float64(2.50)), "2.5");
        assert_eq!(any_to_string(AnyValue::Float64(100.0)), "100");
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_i64_accepts_integral_floats() {
        assert_eq!(any_to_i64(AnyValue::Float64(80.0)), Some(80));
        assert_eq!(any_to_i64(AnyValue::Float64(80.5)), None);
        assert_eq!(any_to_i64(AnyValue::String("443")), Some(443));
        assert_eq!(parse_i64("6.0"), Some(6));
    }

    #[test]
    fn test_any_to_f64_rejects_nan() {
        assert_eq!(any_to_f64(AnyValue::Float64(f64::NAN)), None);
        assert_eq!(any_to_f64(AnyValue::String(" 1.5 ")), Some(1.5));
    }

    #[test]
    fn test_column_cells_keep_nulls() {
        let df = df! {
            "proto" => &[Some("tcp"), None, Some("")],
        }
        .unwrap();
        let cells = column_cells(&df, "proto").unwrap();
        assert_eq!(
            cells,
            vec![Some("tcp".to_string()), None, Some(String::new())]
        );
        assert!(matches!(
            column_cells(&df, "missing"),
            Err(IngestError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_observed_types() {
        let df = df! {
            "port" => &[80i64, 443],
            "bytes" => &[1.5f64, 2.0],
            "proto" => &["tcp", "udp"],
        }
        .unwrap();
        let observed = observed_types(&df);
        assert_eq!(observed["port"], ObservedType::Integer);
        assert_eq!(observed["bytes"], ObservedType::Float);
        assert_eq!(observed["proto"], ObservedType::Text);
    }
}
