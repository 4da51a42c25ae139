//! End-to-end pipeline tests over a temporary working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use trace_cli::job::{JobStatus, spawn_job};
use trace_cli::pipeline::{WorkDir, decode_generated, encode_dataset, run_roundtrip};
use trace_cli::types::ColumnStatus;
use trace_codec::{CellErrorPolicy, DecodeOptions};
use trace_ingest::read_csv_text;

const FLOWS_CSV: &str = "\
srcip,dstip,srcport,proto,pkts,flags,ts,comment
10.0.0.2,192.168.1.9,443,tcp,12,\"SYN,ACK\",2024-01-01 00:00:00.000000,a
10.0.0.1,192.168.1.9,53,udp,1,,2024-01-01 00:00:00.100000,b
10.0.0.1,192.168.1.9,53,udp,-1,FIN,2024-01-01 00:00:00.200000,c
";

fn flows_config() -> Value {
    json!({
        "global_config": {"n_chunks": 1},
        "fields": {
            "metadata": [
                {"name": "srcip", "format": "IP", "type": "IPv4"},
                {"name": "dstip", "format": "IP", "type": "IPv4"},
                {"name": "srcport", "to": "sport", "format": "integer", "encoding": "word2vec_port"},
                {"name": "proto", "format": "string"}
            ],
            "timeseries": [
                {"name": "pkts", "format": "integer", "encoding": "bit"},
                {"name": "flags", "format": "list", "encoding": "list_attributes",
                 "names": ["SYN", "ACK", "FIN"], "delimiter": ","}
            ],
            "timestamp": [
                {"name": "ts", "format": "timestamp", "type": "unprocessed",
                 "time_format": "%Y-%m-%d %H:%M:%S.%f"}
            ]
        }
    })
}

fn write_inputs(dir: &Path, config: &Value) -> (PathBuf, PathBuf) {
    let dataset = dir.join("flows.csv");
    fs::write(&dataset, FLOWS_CSV).unwrap();
    let config_path = dir.join("config.json");
    fs::write(&config_path, serde_json::to_string_pretty(config).unwrap()).unwrap();
    (dataset, config_path)
}

fn cell(path: &Path, column: &str, row: usize) -> String {
    let df = read_csv_text(path).unwrap();
    let value = df.column(column).unwrap().get(row).unwrap();
    trace_ingest::any_to_string(value)
}

#[test]
fn encode_writes_work_dir_layout() {
    let dir = tempfile::tempdir().unwrap();
    let (dataset, config_path) = write_inputs(dir.path(), &flows_config());
    let work = WorkDir::new(dir.path().join("work"));

    let mut stages = Vec::new();
    let result =
        encode_dataset(&dataset, &config_path, &work, |stage| stages.push(stage.to_string()))
            .unwrap();
    assert_eq!(stages, vec!["encode"]);
    assert_eq!(result.reports.len(), 1);
    assert!(work.encoded_csv().is_file());
    assert!(work.generated().is_dir());

    let encoded = read_csv_text(&work.encoded_csv()).unwrap();
    let names: Vec<&str> = encoded
        .get_column_names()
        .iter()
        .map(|n| n.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "srcip",
            "dstip",
            "sport",
            "proto",
            "pkts",
            "flags_SYN",
            "flags_ACK",
            "flags_FIN",
            "ts"
        ]
    );

    let output: Value =
        serde_json::from_str(&fs::read_to_string(work.output_config()).unwrap()).unwrap();
    assert_eq!(output["global_config"]["n_chunks"], 1);
    assert_eq!(
        output["global_config"]["original_data_file"],
        work.encoded_csv().display().to_string()
    );
    insta::assert_json_snapshot!(output["changed_fields"]["flags"], @r#"
    {
      "encoding": "list_attributes",
      "delimiter": ",",
      "new_columns": [
        {
          "column": "flags_SYN",
          "origin": "SYN",
          "encoding": "categorical"
        },
        {
          "column": "flags_ACK",
          "origin": "ACK",
          "encoding": "categorical"
        },
        {
          "column": "flags_FIN",
          "origin": "FIN",
          "encoding": "categorical"
        }
      ]
    }
    "#);
    assert_eq!(output["encoded_columns"].as_array().unwrap().len(), 9);
}

#[test]
fn decode_reads_generated_dir_and_assigns_flows() {
    let dir = tempfile::tempdir().unwrap();
    let (dataset, config_path) = write_inputs(dir.path(), &flows_config());
    let work = WorkDir::new(dir.path().join("work"));
    encode_dataset(&dataset, &config_path, &work, |_| {}).unwrap();
    fs::copy(work.encoded_csv(), work.generated().join("synthetic.csv")).unwrap();

    let result = decode_generated(&work, None, DecodeOptions::default(), |_| {}).unwrap();
    assert_eq!(result.reports.len(), 1);

    let final_output = work.final_output();
    let decoded = read_csv_text(&final_output).unwrap();
    assert_eq!(decoded.height(), 3);
    // Sorted by metadata tuple: the two 10.0.0.1 rows form flow 1.
    assert_eq!(cell(&final_output, "srcip", 0), "10.0.0.1");
    assert_eq!(cell(&final_output, "srcport", 0), "53");
    assert_eq!(cell(&final_output, "flow_id", 1), "1");
    assert_eq!(cell(&final_output, "srcip", 2), "10.0.0.2");
    assert_eq!(cell(&final_output, "flags", 2), "SYN,ACK");
    assert_eq!(cell(&final_output, "flow_id", 2), "2");
    assert_eq!(cell(&final_output, "pkts", 1), "0");
    assert!(decoded.column("comment").is_err());
}

#[test]
fn decode_with_null_policy_reports_bad_cells() {
    let dir = tempfile::tempdir().unwrap();
    let (dataset, config_path) = write_inputs(dir.path(), &flows_config());
    let work = WorkDir::new(dir.path().join("work"));
    encode_dataset(&dataset, &config_path, &work, |_| {}).unwrap();

    let encoded = fs::read_to_string(work.encoded_csv()).unwrap();
    let corrupted = encoded.replacen("167772162", "not-an-ip", 1);
    let generated = work.generated().join("synthetic.csv");
    fs::write(&generated, corrupted).unwrap();

    let err = decode_generated(&work, Some(&generated), DecodeOptions::default(), |_| {});
    assert!(err.is_err());

    let options = DecodeOptions {
        on_cell_error: CellErrorPolicy::Null,
    };
    let result = decode_generated(&work, Some(&generated), options, |_| {}).unwrap();
    let trace_codec::StageSummary::Decoded { cell_errors, .. } = &result.reports[0].summary else {
        panic!("expected a decode summary");
    };
    assert_eq!(cell_errors.len(), 1);
    assert_eq!(cell_errors[0].column, "srcip");
    assert_eq!(cell_errors[0].value, "not-an-ip");
}

#[test]
fn disabled_processors_skip_stages() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = flows_config();
    config["processors"] = json!({"pre_csv": false});
    let (dataset, config_path) = write_inputs(dir.path(), &config);
    let work = WorkDir::new(dir.path().join("work"));

    let result = encode_dataset(&dataset, &config_path, &work, |_| {}).unwrap();
    assert!(result.reports.is_empty());
    assert!(!work.encoded_csv().exists());
}

#[test]
fn roundtrip_job_reports_lossy_columns_only() {
    let dir = tempfile::tempdir().unwrap();
    let (dataset, config_path) = write_inputs(dir.path(), &flows_config());
    let work = WorkDir::new(dir.path().join("work"));

    let mut job = spawn_job("roundtrip", move |reporter| {
        run_roundtrip(&dataset, &config_path, &work, |stage| reporter.stage(stage))
    });
    let result = loop {
        if let Some(result) = job.try_result() {
            break result;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    };
    assert_eq!(job.status(), &JobStatus::Finished);

    let result = result.unwrap();
    assert_eq!(result.reports.len(), 2);
    let mismatched: Vec<&str> = result.mismatches().map(|c| c.column.as_str()).collect();
    // -1 packets collapse to 0.
    assert!(mismatched.contains(&"pkts"));
    for column in ["srcip", "dstip", "srcport", "proto"] {
        let check = result.columns.iter().find(|c| c.column == column).unwrap();
        assert_eq!(check.status, ColumnStatus::Matched, "column {column}");
    }
    let pkts = result.columns.iter().find(|c| c.column == "pkts").unwrap();
    assert_eq!(
        pkts.status,
        ColumnStatus::Differs {
            count: 1,
            example: Some(("-1".to_string(), "0".to_string())),
        }
    );
}
