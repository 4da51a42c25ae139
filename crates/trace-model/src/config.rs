//! Codec configuration document.
//!
//! The config is kept as a raw JSON value next to its typed view so that keys
//! owned by other pipeline stages (model hyper-parameters, global settings)
//! survive into the output config unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::Role;
use crate::error::{ModelError, Result};
use crate::field::{FieldSpec, RawField};
use crate::manifest::ChangedFieldsMap;

/// Layout of the raw dataset handed to the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    #[default]
    Csv,
    /// One JSON object per line.
    #[serde(alias = "zeek_log_json", alias = "jsonl")]
    JsonLines,
}

/// Stage toggles from the `processors` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorToggles {
    #[serde(default = "enabled")]
    pub pre_csv: bool,
    #[serde(default = "enabled")]
    pub post_csv: bool,
}

impl Default for ProcessorToggles {
    fn default() -> Self {
        Self {
            pre_csv: true,
            post_csv: true,
        }
    }
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InputFileSection {
    #[serde(default)]
    format: InputFormat,
}

/// A parsed codec config.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    raw: Value,
    fields: Vec<FieldSpec>,
    input_format: InputFormat,
    processors: ProcessorToggles,
    changed_fields: Option<ChangedFieldsMap>,
    encoded_columns: Option<Vec<String>>,
}

impl CodecConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: Value =
            serde_json::from_str(text).map_err(|source| ModelError::ConfigParse { source })?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self> {
        let sections = raw
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| ModelError::MissingSection {
                section: "fields".to_string(),
            })?;

        let mut fields = Vec::new();
        for role in Role::ALL {
            let Some(entries) = sections.get(role.as_str()) else {
                continue;
            };
            let entries = entries
                .as_array()
                .ok_or_else(|| ModelError::MissingSection {
                    section: format!("fields.{role}"),
                })?;
            for (index, entry) in entries.iter().enumerate() {
                let raw_field: RawField = serde_json::from_value(entry.clone())
                    .map_err(|source| ModelError::FieldEntry {
                        role,
                        index,
                        source,
                    })?;
                fields.push(FieldSpec::from_raw(role, raw_field)?);
            }
        }

        let input_format = section::<InputFileSection>(&raw, "input_file")?
            .unwrap_or_default()
            .format;
        let processors = section::<ProcessorToggles>(&raw, "processors")?.unwrap_or_default();
        let changed_fields = section::<ChangedFieldsMap>(&raw, "changed_fields")?;
        let encoded_columns = section::<Vec<String>>(&raw, "encoded_columns")?;

        Ok(Self {
            raw,
            fields,
            input_format,
            processors,
            changed_fields,
            encoded_columns,
        })
    }

    /// The config document as loaded.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Declared fields in role-then-declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn input_format(&self) -> InputFormat {
        self.input_format
    }

    pub fn processors(&self) -> ProcessorToggles {
        self.processors
    }

    /// Manifest written by a previous encode run, if this is an output config.
    pub fn changed_fields(&self) -> Option<&ChangedFieldsMap> {
        self.changed_fields.as_ref()
    }

    /// Encoded column list written by a previous encode run.
    pub fn encoded_columns(&self) -> Option<&[String]> {
        self.encoded_columns.as_deref()
    }
}

fn section<T: serde::de::DeserializeOwned>(raw: &Value, key: &str) -> Result<Option<T>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|_| ModelError::MissingSection {
                section: key.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_section() {
        let err = CodecConfig::from_value(json!({"processors": {}})).unwrap_err();
        assert!(matches!(err, ModelError::MissingSection { section } if section == "fields"));
    }

    #[test]
    fn test_processor_defaults() {
        let config = CodecConfig::from_value(json!({
            "fields": {"metadata": []},
            "processors": {"post_csv": false}
        }))
        .unwrap();
        assert!(config.processors().pre_csv);
        assert!(!config.processors().post_csv);
        assert_eq!(config.input_format(), InputFormat::Csv);
        assert!(config.changed_fields().is_none());
    }

    #[test]
    fn test_input_format_alias() {
        let config = CodecConfig::from_value(json!({
            "fields": {},
            "input_file": {"format": "zeek_log_json"}
        }))
        .unwrap();
        assert_eq!(config.input_format(), InputFormat::JsonLines);
    }

    #[test]
    fn test_bad_entry_reports_position() {
        let err = CodecConfig::from_value(json!({
            "fields": {"timeseries": [{"name": "bytes", "format": "float"}, {"format": "float"}]}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ModelError::FieldEntry {
                role: Role::Timeseries,
                index: 1,
                ..
            }
        ));
    }
}
