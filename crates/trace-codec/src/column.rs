//! Typed column buffers produced by the encoder.

use polars::prelude::{AnyValue, DataFrame, NamedFrom, Series};
use trace_ingest::{any_to_f64, any_to_i64, any_to_string, column_cells};
use trace_model::ValueFormat;

use crate::error::{CellError, CodecError, Result};

/// Cell values of one encoded column. `None` marks a cell awaiting the
/// abnormal-value sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An encoded column ready to be swept and emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedColumn {
    pub name: String,
    pub format: ValueFormat,
    pub values: ColumnValues,
}

impl EncodedColumn {
    pub fn new(name: impl Into<String>, format: ValueFormat, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            format,
            values,
        }
    }

    pub fn into_series(self) -> Series {
        let name = self.name.as_str().into();
        match self.values {
            ColumnValues::Integer(v) => Series::new(name, v),
            ColumnValues::Float(v) => Series::new(name, v),
            ColumnValues::Text(v) => Series::new(name, v),
        }
    }
}

/// Reads a source column as integers.
///
/// Null, NaN and blank cells become `None` for the abnormal sweep. Any other
/// value that is not an exact integer fails the encode.
pub fn integer_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df
        .column(name)
        .map_err(|_| CodecError::ColumnNotFound(name.to_string()))?;
    let mut cells = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = column.get(idx)?;
        if is_blank(&value) {
            cells.push(None);
            continue;
        }
        let Some(integer) = any_to_i64(value.clone()) else {
            return Err(CodecError::EncodeCell(CellError::new(
                name,
                idx,
                &any_to_string(value),
                "not an integer",
            )));
        };
        cells.push(Some(integer));
    }
    Ok(cells)
}

fn is_blank(value: &AnyValue<'_>) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::Float32(v) => v.is_nan(),
        AnyValue::Float64(v) => v.is_nan(),
        AnyValue::String(s) => s.trim().is_empty(),
        AnyValue::StringOwned(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Reads a source column as floats; NaN becomes `None`.
pub fn float_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| CodecError::ColumnNotFound(name.to_string()))?;
    let mut cells = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        cells.push(any_to_f64(column.get(idx)?));
    }
    Ok(cells)
}

/// Reads a source column as text, keeping nulls.
pub fn text_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    column_cells(df, name).map_err(|_| CodecError::ColumnNotFound(name.to_string()))
}
