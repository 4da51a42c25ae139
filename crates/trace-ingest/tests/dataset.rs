use std::fs;

use trace_ingest::{column_cells, read_csv_text, read_dataset, resolve_csv, write_csv};
use trace_model::InputFormat;

#[test]
fn csv_dataset_survives_write_and_text_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raw = dir.path().join("raw.csv");
    fs::write(
        &raw,
        "srcip,dstport,extra\n10.0.0.1,53,\"ttl = 64\nservice = dns\"\n10.0.0.2,-1,\n",
    )
    .expect("write raw");

    let df = read_dataset(&raw, InputFormat::Csv).expect("read dataset");
    assert_eq!(df.height(), 2);

    let out_dir = dir.path().join("generated_data");
    write_csv(&df, &out_dir.join("syn.csv")).expect("write csv");

    let generated = resolve_csv(&out_dir).expect("resolve csv");
    let text = read_csv_text(&generated).expect("read text");
    let ports = column_cells(&text, "dstport").expect("dstport");
    assert_eq!(ports, vec![Some("53".to_string()), Some("-1".to_string())]);
    let extra = column_cells(&text, "extra").expect("extra");
    assert_eq!(extra[0].as_deref(), Some("ttl = 64\nservice = dns"));
    assert!(extra[1].as_deref().unwrap_or_default().is_empty());
}

#[test]
fn json_lines_dataset_reads_by_config_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conn.log");
    fs::write(
        &path,
        "{\"id.orig_h\": \"10.0.0.1\", \"orig_bytes\": 10}\n{\"id.orig_h\": \"10.0.0.2\"}\n",
    )
    .expect("write log");
    let df = read_dataset(&path, InputFormat::JsonLines).expect("read dataset");
    let bytes = column_cells(&df, "orig_bytes").expect("orig_bytes");
    assert_eq!(bytes, vec![Some("10".to_string()), None]);
}
