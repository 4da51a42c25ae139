//! Field entries: the raw config form and the resolved [`FieldSpec`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{
    AddressFamily, Encoding, FieldFormat, Normalization, PrimitiveType, Role, TimestampKind,
    ValueFormat,
};
use crate::error::{ModelError, Result};

/// A field entry exactly as written in a role list of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub format: String,
    /// Address family for IP fields, `processed`/`unprocessed` for timestamps.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Label array (list attributes) or `label -> encoding` object (list values).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<String>,
    #[serde(default)]
    pub abnormal: bool,
}

/// One declared key of a composite field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    pub label: String,
    pub encoding: Encoding,
}

impl CompositeKey {
    /// Value format of the derived column generated for this key.
    pub fn value_format(&self) -> ValueFormat {
        match self.encoding {
            Encoding::Categorical => ValueFormat::Text,
            _ => ValueFormat::Numeric,
        }
    }
}

/// A validated field description.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Column name in the raw dataset.
    pub name: String,
    /// Column name in the encoded dataset.
    pub to: String,
    pub role: Role,
    pub primitive: PrimitiveType,
    pub encoding: Encoding,
    pub delimiter: Option<String>,
    pub time_format: Option<String>,
    pub timestamp_kind: TimestampKind,
    pub normalization: Normalization,
    /// Declared keys for composite fields, in declaration order.
    pub keys: Vec<CompositeKey>,
    /// Use the strict abnormal-value sweep for this field.
    pub abnormal: bool,
}

impl FieldSpec {
    /// Resolve a raw config entry declared under `role`.
    pub fn from_raw(role: Role, raw: RawField) -> Result<Self> {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(ModelError::MissingAttribute {
                field: raw.name,
                attribute: "name",
            });
        }
        let format: FieldFormat = raw
            .format
            .parse()
            .map_err(|_| unknown(&name, "format", &raw.format))?;
        let encoding = raw
            .encoding
            .as_deref()
            .map(|value| value.parse::<Encoding>().map_err(|_| unknown(&name, "encoding", value)))
            .transpose()?;
        let normalization = raw
            .normalization
            .as_deref()
            .map(|value| {
                value
                    .parse::<Normalization>()
                    .map_err(|_| unknown(&name, "normalization", value))
            })
            .transpose()?
            .unwrap_or_default();
        let to = raw
            .to
            .as_deref()
            .map(str::trim)
            .filter(|to| !to.is_empty())
            .unwrap_or(name.as_str())
            .to_string();

        let mut spec = FieldSpec {
            name: name.clone(),
            to,
            role,
            primitive: PrimitiveType::String,
            encoding: Encoding::Categorical,
            delimiter: None,
            time_format: None,
            timestamp_kind: TimestampKind::default(),
            normalization,
            keys: Vec::new(),
            abnormal: raw.abnormal,
        };

        match format {
            FieldFormat::Integer => {
                let encoding = encoding.ok_or_else(|| missing(&name, "encoding"))?;
                if !encoding.is_integer_encoding() {
                    return Err(not_allowed(&name, encoding, format));
                }
                spec.primitive = PrimitiveType::Integer;
                spec.encoding = encoding;
            }
            FieldFormat::String => {
                if let Some(encoding) = encoding.filter(|e| *e != Encoding::Categorical) {
                    return Err(not_allowed(&name, encoding, format));
                }
            }
            FieldFormat::Float => {
                if let Some(encoding) = encoding.filter(|e| *e != Encoding::Float) {
                    return Err(not_allowed(&name, encoding, format));
                }
                spec.primitive = PrimitiveType::Float;
                spec.encoding = Encoding::Float;
            }
            FieldFormat::Timestamp => {
                if role != Role::Timestamp {
                    return Err(ModelError::TimestampOutsideRole { field: name, role });
                }
                if let Some(encoding) = encoding.filter(|e| *e != Encoding::Interarrival) {
                    return Err(not_allowed(&name, encoding, format));
                }
                let kind = raw
                    .kind
                    .as_deref()
                    .map(|value| {
                        value
                            .parse::<TimestampKind>()
                            .map_err(|_| unknown(&name, "type", value))
                    })
                    .transpose()?
                    .unwrap_or_default();
                if kind == TimestampKind::Unprocessed {
                    let time_format = raw
                        .time_format
                        .filter(|f| !f.is_empty())
                        .ok_or_else(|| missing(&name, "time_format"))?;
                    spec.time_format = Some(time_format);
                }
                spec.primitive = PrimitiveType::Timestamp;
                spec.encoding = Encoding::Interarrival;
                spec.timestamp_kind = kind;
            }
            FieldFormat::Ip => {
                let kind = raw.kind.as_deref().ok_or_else(|| missing(&name, "type"))?;
                let family: AddressFamily =
                    kind.parse().map_err(|_| unknown(&name, "type", kind))?;
                if let Some(encoding) = encoding.filter(|e| *e != Encoding::Bit) {
                    return Err(not_allowed(&name, encoding, format));
                }
                spec.primitive = match family {
                    AddressFamily::V4 => PrimitiveType::Ipv4,
                    AddressFamily::V6 => PrimitiveType::Ipv6,
                };
                spec.encoding = Encoding::Bit;
            }
            FieldFormat::List => {
                let encoding = encoding.ok_or_else(|| missing(&name, "encoding"))?;
                let delimiter = raw
                    .delimiter
                    .filter(|d| !d.trim().is_empty())
                    .ok_or_else(|| missing(&name, "delimiter"))?;
                let names = raw.names.ok_or_else(|| missing(&name, "names"))?;
                spec.keys = match encoding {
                    Encoding::ListAttributes => {
                        spec.primitive = PrimitiveType::ListAttributes;
                        attribute_keys(&name, &names)?
                    }
                    Encoding::ListValues => {
                        spec.primitive = PrimitiveType::ListValues;
                        value_keys(&name, &names)?
                    }
                    other => return Err(not_allowed(&name, other, format)),
                };
                spec.encoding = encoding;
                spec.delimiter = Some(delimiter);
            }
        }

        Ok(spec)
    }

    /// Family of an address field.
    pub fn address_family(&self) -> Option<AddressFamily> {
        match self.primitive {
            PrimitiveType::Ipv4 => Some(AddressFamily::V4),
            PrimitiveType::Ipv6 => Some(AddressFamily::V6),
            _ => None,
        }
    }

    /// Name of the derived column holding `label`.
    pub fn derived_column(&self, label: &str) -> String {
        derived_column_name(&self.to, label)
    }

    /// Columns this field contributes to the encoded table, in order.
    pub fn output_columns(&self) -> Vec<String> {
        if self.primitive.is_composite() {
            self.keys
                .iter()
                .map(|key| self.derived_column(&key.label))
                .collect()
        } else {
            vec![self.to.clone()]
        }
    }

    /// Value format of the encoded column for scalar fields.
    pub fn value_format(&self) -> ValueFormat {
        match self.primitive {
            PrimitiveType::String | PrimitiveType::ListAttributes => ValueFormat::Text,
            _ => ValueFormat::Numeric,
        }
    }
}

/// Builds the `<base>_<label>` name used for derived columns.
pub fn derived_column_name(base: &str, label: &str) -> String {
    format!("{base}_{label}")
}

fn attribute_keys(field: &str, names: &Value) -> Result<Vec<CompositeKey>> {
    let Value::Array(items) = names else {
        return Err(invalid_names(field, "expected an array of labels"));
    };
    if items.is_empty() {
        return Err(invalid_names(field, "at least one label is required"));
    }
    items
        .iter()
        .map(|item| match item {
            Value::String(label) if !label.is_empty() => Ok(CompositeKey {
                label: label.clone(),
                encoding: Encoding::Categorical,
            }),
            other => Err(invalid_names(field, &format!("label {other} is not a string"))),
        })
        .collect()
}

fn value_keys(field: &str, names: &Value) -> Result<Vec<CompositeKey>> {
    let Value::Object(entries) = names else {
        return Err(invalid_names(field, "expected an object of label to encoding"));
    };
    if entries.is_empty() {
        return Err(invalid_names(field, "at least one key is required"));
    }
    entries
        .iter()
        .map(|(label, encoding)| {
            let text = encoding
                .as_str()
                .map_or_else(|| encoding.to_string(), str::to_string);
            let encoding: Encoding = text
                .parse()
                .map_err(|_| unknown(field, "encoding", &text))?;
            if !encoding.is_scalar() {
                return Err(not_allowed(field, encoding, FieldFormat::List));
            }
            Ok(CompositeKey {
                label: label.clone(),
                encoding,
            })
        })
        .collect()
}

fn unknown(field: &str, key: &'static str, value: &str) -> ModelError {
    ModelError::UnknownValue {
        field: field.to_string(),
        key,
        value: value.to_string(),
    }
}

fn missing(field: &str, attribute: &'static str) -> ModelError {
    ModelError::MissingAttribute {
        field: field.to_string(),
        attribute,
    }
}

fn not_allowed(field: &str, encoding: Encoding, format: FieldFormat) -> ModelError {
    ModelError::EncodingNotAllowed {
        field: field.to_string(),
        encoding: encoding.to_string(),
        format: format.to_string(),
    }
}

fn invalid_names(field: &str, reason: &str) -> ModelError {
    ModelError::InvalidAttribute {
        field: field.to_string(),
        attribute: "names",
        reason: reason.to_string(),
    }
}
