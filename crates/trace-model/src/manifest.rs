//! The changed-fields manifest: how each transformed column can be inverted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{AddressFamily, Encoding};

/// A column the encoder derived from a composite field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedColumn {
    /// Name of the derived column in the encoded table.
    pub column: String,
    /// Attribute label or value key this column represents.
    pub origin: String,
    pub encoding: Encoding,
}

/// Transform descriptor recorded for one original column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum ChangedField {
    Address {
        family: AddressFamily,
    },
    Timestamp {
        time_format: String,
    },
    ListAttributes {
        delimiter: String,
        new_columns: Vec<DerivedColumn>,
    },
    ListValues {
        delimiter: String,
        new_columns: Vec<DerivedColumn>,
    },
}

impl ChangedField {
    pub fn kind(&self) -> &'static str {
        match self {
            ChangedField::Address { .. } => "address",
            ChangedField::Timestamp { .. } => "timestamp",
            ChangedField::ListAttributes { .. } => "list_attributes",
            ChangedField::ListValues { .. } => "list_values",
        }
    }

    /// Derived columns for composite descriptors; empty otherwise.
    pub fn derived_columns(&self) -> &[DerivedColumn] {
        match self {
            ChangedField::ListAttributes { new_columns, .. }
            | ChangedField::ListValues { new_columns, .. } => new_columns,
            ChangedField::Address { .. } | ChangedField::Timestamp { .. } => &[],
        }
    }
}

/// Mapping from original column name to its transform descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangedFieldsMap(BTreeMap<String, ChangedField>);

impl ChangedFieldsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, change: ChangedField) {
        self.0.insert(column.into(), change);
    }

    pub fn get(&self, column: &str) -> Option<&ChangedField> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChangedField)> {
        self.0.iter()
    }
}
