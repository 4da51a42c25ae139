//! Abnormal-value substitution.
//!
//! Missing, empty and `-1` cells are replaced by a per-format sentinel
//! (`"unavailable"` for text, `0` for numbers) before the table reaches the
//! model. Sentinels are ordinary values on the way back and pass through the
//! decoder untouched; a legitimate zero and a missing value therefore encode
//! to the same cell.

use trace_model::{FieldSpec, ValueFormat};

use crate::column::{ColumnValues, EncodedColumn};

/// How aggressively a field's cells are treated as abnormal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SweepMode {
    /// Null, empty, `-1` and NaN.
    #[default]
    Standard,
    /// Additionally any negative number and whitespace-only text.
    Strict,
}

/// Sentinel substitution applied to encoded columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbnormalPolicy {
    mode: SweepMode,
}

impl AbnormalPolicy {
    pub fn new(mode: SweepMode) -> Self {
        Self { mode }
    }

    /// Policy for a field: strict when the field sets `abnormal`.
    pub fn for_field(field: &FieldSpec) -> Self {
        if field.abnormal {
            Self::new(SweepMode::Strict)
        } else {
            Self::new(SweepMode::Standard)
        }
    }

    pub fn mode(&self) -> SweepMode {
        self.mode
    }

    /// Returns true if a raw text cell should become the sentinel.
    pub fn is_abnormal_text(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return true;
        };
        if value.is_empty() || value == "-1" {
            return true;
        }
        match self.mode {
            SweepMode::Standard => false,
            SweepMode::Strict => {
                let trimmed = value.trim();
                trimmed.is_empty() || trimmed.parse::<f64>().is_ok_and(|v| v < 0.0)
            }
        }
    }

    pub fn is_abnormal_integer(&self, value: Option<i64>) -> bool {
        match (value, self.mode) {
            (None, _) | (Some(-1), _) => true,
            (Some(v), SweepMode::Strict) => v < 0,
            (Some(_), SweepMode::Standard) => false,
        }
    }

    pub fn is_abnormal_float(&self, value: Option<f64>) -> bool {
        match (value, self.mode) {
            (None, _) => true,
            (Some(v), _) if v.is_nan() || v == -1.0 => true,
            (Some(v), SweepMode::Strict) => v < 0.0,
            (Some(_), SweepMode::Standard) => false,
        }
    }

    /// Replaces abnormal cells with the column's sentinel.
    ///
    /// Returns the number of cells substituted.
    pub fn sweep(&self, column: &mut EncodedColumn) -> usize {
        let mut substituted = 0;
        match &mut column.values {
            ColumnValues::Integer(values) => {
                for cell in values.iter_mut() {
                    if self.is_abnormal_integer(*cell) {
                        *cell = Some(0);
                        substituted += 1;
                    }
                }
            }
            ColumnValues::Float(values) => {
                for cell in values.iter_mut() {
                    if self.is_abnormal_float(*cell) {
                        *cell = Some(0.0);
                        substituted += 1;
                    }
                }
            }
            ColumnValues::Text(values) => {
                let sentinel = column.format.sentinel();
                for cell in values.iter_mut() {
                    if self.is_abnormal_text(cell.as_deref()) {
                        *cell = Some(sentinel.to_string());
                        substituted += 1;
                    }
                }
            }
        }
        substituted
    }
}

/// Returns true if `value` is the sentinel for `format`.
pub fn is_sentinel(value: &str, format: ValueFormat) -> bool {
    value == format.sentinel()
}
