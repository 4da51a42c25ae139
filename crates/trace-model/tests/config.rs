//! Tests for loading a complete codec config.

use trace_model::{
    AddressFamily, CodecConfig, Encoding, ModelError, PrimitiveType, Role, Schema, TimestampKind,
};

const NETFLOW_CONFIG: &str = r#"{
    "global_config": {"overwrite": true},
    "fields": {
        "metadata": [
            {"name": "srcip", "format": "IP", "type": "IPv4", "encoding": "bit"},
            {"name": "dstport", "format": "integer", "encoding": "word2vec_port"},
            {"name": "proto", "format": "string", "abnormal": true}
        ],
        "timeseries": [
            {"name": "bytes", "format": "float", "normalization": "MINUSONE_ONE"},
            {"name": "flags", "format": "list", "encoding": "list_attributes",
             "names": ["SYN", "ACK", "FIN"], "delimiter": ","}
        ],
        "timestamp": [
            {"name": "ts", "format": "timestamp", "type": "unprocessed",
             "time_format": "%Y-%m-%d %H:%M:%S.%f"}
        ]
    }
}"#;

#[test]
fn netflow_config_resolves() {
    let config = CodecConfig::from_json_str(NETFLOW_CONFIG).expect("parse config");
    let fields = config.fields();
    assert_eq!(fields.len(), 6);

    assert_eq!(fields[0].primitive, PrimitiveType::Ipv4);
    assert_eq!(fields[0].address_family(), Some(AddressFamily::V4));
    assert_eq!(fields[1].encoding, Encoding::WordPort);
    assert!(fields[2].abnormal);
    assert_eq!(fields[3].role, Role::Timeseries);
    assert_eq!(fields[4].delimiter.as_deref(), Some(","));
    assert_eq!(fields[5].timestamp_kind, TimestampKind::Unprocessed);
    assert_eq!(
        fields[5].time_format.as_deref(),
        Some("%Y-%m-%d %H:%M:%S.%f")
    );

    assert_eq!(config.raw()["global_config"]["overwrite"], true);
}

#[test]
fn schema_lists_encoded_columns_in_order() {
    let config = CodecConfig::from_json_str(NETFLOW_CONFIG).expect("parse config");
    let schema = Schema::from_fields(config.fields().to_vec()).expect("schema");
    assert_eq!(
        schema.encoded_columns(),
        vec![
            "srcip",
            "dstport",
            "proto",
            "bytes",
            "flags_SYN",
            "flags_ACK",
            "flags_FIN",
            "ts"
        ]
    );
    assert_eq!(schema.fields_in(Role::Metadata).count(), 3);
}

#[test]
fn malformed_json_is_fatal() {
    let err = CodecConfig::from_json_str("{\"fields\": ").unwrap_err();
    assert!(matches!(err, ModelError::ConfigParse { .. }));
}

#[test]
fn unknown_format_names_the_field() {
    let err = CodecConfig::from_json_str(
        r#"{"fields": {"metadata": [{"name": "mac", "format": "ether"}]}}"#,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "field 'mac': unknown format 'ether'");
}

#[test]
fn duplicate_rename_targets_rejected() {
    let config = CodecConfig::from_json_str(
        r#"{"fields": {"metadata": [
            {"name": "a", "to": "x", "format": "string"},
            {"name": "b", "to": "x", "format": "string"}
        ]}}"#,
    )
    .expect("parse config");
    let err = Schema::from_fields(config.fields().to_vec()).unwrap_err();
    assert!(matches!(err, ModelError::DuplicateColumn { column } if column == "x"));
}
