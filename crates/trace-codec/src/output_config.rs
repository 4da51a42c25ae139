//! Output config assembly.
//!
//! The output config is the input config with dropped fields pruned and the
//! encode results attached: the changed-fields manifest, the encoded column
//! list, the generation directives and the encoded dataset path.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};
use trace_model::{CodecConfig, Role, Schema};

use crate::encoder::EncodeOutput;
use crate::error::Result;

/// Builds the output config written next to the encoded dataset.
pub fn build_output_config(
    config: &CodecConfig,
    schema: &Schema,
    output: &EncodeOutput,
    encoded_path: &Path,
) -> Result<Value> {
    let mut root = match config.raw() {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    prune_dropped_fields(&mut root, schema);

    root.insert(
        "changed_fields".to_string(),
        serde_json::to_value(&output.changed)?,
    );
    root.insert(
        "encoded_columns".to_string(),
        serde_json::to_value(&output.encoded_columns)?,
    );

    let generation = serde_json::to_value(&output.generation)?;
    merge_object(&mut root, "pre_post_processor", [("config".to_string(), generation)]);
    merge_object(
        &mut root,
        "global_config",
        [(
            "original_data_file".to_string(),
            Value::String(encoded_path.display().to_string()),
        )],
    );

    Ok(Value::Object(root))
}

/// Removes dropped fields from every `fields.<role>` array.
fn prune_dropped_fields(root: &mut Map<String, Value>, schema: &Schema) {
    if schema.dropped().is_empty() {
        return;
    }
    let dropped: BTreeSet<(Role, &str)> = schema
        .dropped()
        .iter()
        .map(|field| (field.role, field.name.as_str()))
        .collect();

    let Some(Value::Object(sections)) = root.get_mut("fields") else {
        return;
    };
    for role in Role::ALL {
        let Some(Value::Array(entries)) = sections.get_mut(role.as_str()) else {
            continue;
        };
        entries.retain(|entry| {
            let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
            let keep = !dropped.contains(&(role, name));
            if !keep {
                tracing::debug!(field = name, %role, "pruned dropped field from output config");
            }
            keep
        });
    }
}

/// Merges `entries` into the object under `key`, replacing a non-object value.
fn merge_object(
    root: &mut Map<String, Value>,
    key: &str,
    entries: impl IntoIterator<Item = (String, Value)>,
) {
    let mut section = match root.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    section.extend(entries);
    root.insert(key.to_string(), Value::Object(section));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use polars::prelude::df;
    use serde_json::json;
    use trace_model::ObservedType;

    use crate::encoder::encode;

    fn sample_config() -> CodecConfig {
        CodecConfig::from_value(json!({
            "fields": {
                "metadata": [
                    {"name": "srcip", "format": "IP", "type": "IPv4", "encoding": "bit"},
                    {"name": "dstport", "format": "integer", "encoding": "word_port"}
                ],
                "timeseries": [
                    {"name": "pkts", "format": "float"}
                ]
            },
            "model": {"epochs": 400}
        }))
        .unwrap()
    }

    #[test]
    fn test_output_config_prunes_and_annotates() {
        let config = sample_config();
        let table = df! {
            "srcip" => &["10.0.0.1"],
            "dstport" => &["http"],
            "pkts" => &[3.0f64],
        }
        .unwrap();
        let observed = BTreeMap::from([
            ("srcip".to_string(), ObservedType::Text),
            ("dstport".to_string(), ObservedType::Text),
            ("pkts".to_string(), ObservedType::Float),
        ]);
        let schema = Schema::resolve(config.fields().to_vec(), &observed).unwrap();
        let output = encode(&schema, &table).unwrap();
        let value =
            build_output_config(&config, &schema, &output, Path::new("work/encoded.csv")).unwrap();

        let metadata = value["fields"]["metadata"].as_array().unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[0]["name"], "srcip");
        assert_eq!(value["model"]["epochs"], 400);
        assert_eq!(value["encoded_columns"], json!(["srcip", "pkts"]));
        assert_eq!(value["global_config"]["original_data_file"], "work/encoded.csv");

        insta::assert_json_snapshot!(value["changed_fields"], @r#"
        {
          "srcip": {
            "encoding": "address",
            "family": "IPv4"
          }
        }
        "#);
        insta::assert_json_snapshot!(value["pre_post_processor"]["config"], @r#"
        {
          "metadata": [
            {
              "column": "srcip",
              "type": "integer",
              "encoding": "bit",
              "n_bits": 32,
              "categorical_mapping": false
            }
          ],
          "timeseries": [
            {
              "column": "pkts",
              "type": "float",
              "normalization": "ZERO_ONE",
              "log1p_norm": true
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_written_config_loads_as_manifest() {
        let config = sample_config();
        let table = df! {
            "srcip" => &["10.0.0.1"],
            "dstport" => &[80i64],
            "pkts" => &[3.0f64],
        }
        .unwrap();
        let schema = Schema::from_fields(config.fields().to_vec()).unwrap();
        let output = encode(&schema, &table).unwrap();
        let value = build_output_config(&config, &schema, &output, Path::new("x.csv")).unwrap();

        let reloaded = CodecConfig::from_value(value).unwrap();
        assert_eq!(reloaded.changed_fields(), Some(&output.changed));
        assert_eq!(
            reloaded.encoded_columns(),
            Some(["srcip", "dstport", "pkts"].map(String::from).as_slice())
        );
    }
}
