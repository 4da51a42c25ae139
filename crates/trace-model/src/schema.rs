//! Ordered field schema and dataset type validation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::enums::{ObservedType, PrimitiveType, Role};
use crate::error::{ModelError, Result};
use crate::field::FieldSpec;

/// Column the decoder appends to every reconstructed table.
pub const FLOW_ID_COLUMN: &str = "flow_id";

/// A field excluded because the dataset column has an incompatible dtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedField {
    pub name: String,
    pub role: Role,
    pub declared: PrimitiveType,
    pub observed: ObservedType,
}

/// Validated fields in role-then-declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    dropped: Vec<DroppedField>,
}

impl Schema {
    /// Build a schema from resolved fields without consulting a dataset.
    ///
    /// Fields are stably reordered by role. Raw names, encoded names and
    /// derived column names must all be unique.
    pub fn from_fields(mut fields: Vec<FieldSpec>) -> Result<Self> {
        fields.sort_by_key(|field| field.role);
        validate_names(&fields)?;
        Ok(Self {
            fields,
            dropped: Vec::new(),
        })
    }

    /// Build a schema, dropping fields whose declared type disagrees with
    /// the dataset's observed column type.
    ///
    /// A declared field missing from the dataset is an error.
    pub fn resolve(fields: Vec<FieldSpec>, observed: &BTreeMap<String, ObservedType>) -> Result<Self> {
        let mut schema = Self::from_fields(fields)?;
        let mut kept = Vec::with_capacity(schema.fields.len());
        for field in std::mem::take(&mut schema.fields) {
            let Some(observed) = observed.get(&field.name).copied() else {
                return Err(ModelError::MissingColumn { field: field.name });
            };
            if is_compatible(field.primitive, observed) {
                kept.push(field);
            } else {
                schema.dropped.push(DroppedField {
                    name: field.name,
                    role: field.role,
                    declared: field.primitive,
                    observed,
                });
            }
        }
        schema.fields = kept;
        Ok(schema)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields excluded by [`Schema::resolve`].
    pub fn dropped(&self) -> &[DroppedField] {
        &self.dropped
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn fields_in(&self, role: Role) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |field| field.role == role)
    }

    /// Ordered column names of the encoded table.
    pub fn encoded_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(FieldSpec::output_columns)
            .collect()
    }
}

/// Type check applied to integer, string and address fields.
///
/// Integers may arrive as floats when the column has gaps. All-null columns
/// carry no type information and are accepted.
fn is_compatible(declared: PrimitiveType, observed: ObservedType) -> bool {
    if observed == ObservedType::Null {
        return true;
    }
    match declared {
        PrimitiveType::Integer => observed != ObservedType::Text,
        PrimitiveType::String | PrimitiveType::Ipv4 | PrimitiveType::Ipv6 => {
            observed == ObservedType::Text
        }
        _ => true,
    }
}

fn validate_names(fields: &[FieldSpec]) -> Result<()> {
    let mut raw_names = BTreeSet::new();
    let mut columns = BTreeSet::new();
    let mut timestamp: Option<&str> = None;
    for field in fields {
        if !raw_names.insert(field.name.as_str()) {
            return Err(ModelError::DuplicateColumn {
                column: field.name.clone(),
            });
        }
        if field.name == FLOW_ID_COLUMN {
            return Err(ModelError::ReservedColumn {
                column: field.name.clone(),
            });
        }
        for column in field.output_columns() {
            if column == FLOW_ID_COLUMN {
                return Err(ModelError::ReservedColumn { column });
            }
            if !columns.insert(column.clone()) {
                return Err(ModelError::DuplicateColumn { column });
            }
        }
        if field.role == Role::Timestamp {
            if let Some(first) = timestamp {
                return Err(ModelError::MultipleTimestampFields {
                    first: first.to_string(),
                    second: field.name.clone(),
                });
            }
            timestamp = Some(field.name.as_str());
        }
    }
    Ok(())
}
