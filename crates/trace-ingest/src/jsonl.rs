//! JSON-lines dataset reading (one object per line, as written by zeek).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::reader::{check_file_size, validate_header};

/// Reads a JSON-lines file into a frame.
///
/// Columns appear in first-seen key order. A column whose values are all
/// integers becomes Int64, all numbers Float64, anything else String.
/// Arrays are joined with `,`.
pub fn read_json_lines(path: &Path) -> Result<DataFrame> {
    check_file_size(path)?;
    let file = File::open(path).map_err(|e| IngestError::read(path, e))?;
    let reader = BufReader::new(file);

    let mut order: Vec<String> = Vec::new();
    let mut values: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    let mut rows = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(line).map_err(|e| IngestError::JsonLine {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        let Value::Object(record) = record else {
            return Err(IngestError::JsonLine {
                path: path.to_path_buf(),
                line: idx + 1,
                message: "expected a JSON object".to_string(),
            });
        };
        for (key, value) in record {
            let column = values.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                vec![Value::Null; rows]
            });
            column.push(value);
        }
        rows += 1;
        for column in values.values_mut() {
            if column.len() < rows {
                column.push(Value::Null);
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(order.len());
    for name in &order {
        let cells = values.remove(name).unwrap_or_default();
        columns.push(build_series(name, &cells).into_column());
    }
    let df = DataFrame::new(columns)?;
    validate_header(&df, path)?;
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read json lines"
    );
    Ok(df)
}

fn build_series(name: &str, cells: &[Value]) -> Series {
    let non_null = || cells.iter().filter(|v| !v.is_null());
    let has_values = non_null().next().is_some();
    if has_values && non_null().all(|v| v.as_i64().is_some()) {
        let ints: Vec<Option<i64>> = cells.iter().map(Value::as_i64).collect();
        return Series::new(name.into(), ints);
    }
    if has_values && non_null().all(Value::is_number) {
        let floats: Vec<Option<f64>> = cells.iter().map(Value::as_f64).collect();
        return Series::new(name.into(), floats);
    }
    let text: Vec<Option<String>> = cells.iter().map(value_text).collect();
    Series::new(name.into(), text)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
