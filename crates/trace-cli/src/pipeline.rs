//! Staged encode/decode pipeline over a working directory.
//!
//! # Working Directory Layout
//!
//! ```text
//! <work>/pre_processed_data/encoded.csv
//! <work>/pre_processed_data/config.json
//! <work>/generated_data/*.csv          (external model output)
//! <work>/post_processed_data/final_output.csv
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span, warn};
use trace_codec::{
    DecodeOptions, ENCODED_FILE, FINAL_OUTPUT_FILE, OUTPUT_CONFIG_FILE, StageIo, StagePlan,
};
use trace_ingest::{column_cells, load_config, read_csv_text, read_dataset};
use trace_model::CodecConfig;

use crate::types::{ColumnCheck, ColumnStatus, PipelineResult, RoundtripResult};

pub const PRE_PROCESSED_DIR: &str = "pre_processed_data";
pub const GENERATED_DIR: &str = "generated_data";
pub const POST_PROCESSED_DIR: &str = "post_processed_data";

/// Paths inside a pipeline working directory.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pre_processed(&self) -> PathBuf {
        self.root.join(PRE_PROCESSED_DIR)
    }

    pub fn generated(&self) -> PathBuf {
        self.root.join(GENERATED_DIR)
    }

    pub fn post_processed(&self) -> PathBuf {
        self.root.join(POST_PROCESSED_DIR)
    }

    pub fn encoded_csv(&self) -> PathBuf {
        self.pre_processed().join(ENCODED_FILE)
    }

    pub fn output_config(&self) -> PathBuf {
        self.pre_processed().join(OUTPUT_CONFIG_FILE)
    }

    pub fn final_output(&self) -> PathBuf {
        self.post_processed().join(FINAL_OUTPUT_FILE)
    }

    /// Creates the stage directories.
    pub fn create(&self) -> Result<()> {
        for dir in [self.pre_processed(), self.generated(), self.post_processed()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Runs the encode stage when `processors.pre_csv` is enabled.
pub fn encode_dataset(
    dataset: &Path,
    config_path: &Path,
    work: &WorkDir,
    on_stage: impl FnMut(&str),
) -> Result<PipelineResult> {
    let config = load_config(config_path).context("load config")?;
    let plan = StagePlan::from_toggles(config.processors(), DecodeOptions::default());
    if !plan.has_preprocess() {
        warn!("encode stage disabled by processors.pre_csv");
        return Ok(PipelineResult::default());
    }
    work.create()?;

    let span = info_span!("encode", dataset = %dataset.display());
    let _guard = span.enter();
    let start = Instant::now();
    let io = StageIo::new(dataset, config_path, work.pre_processed());
    let reports = plan
        .run_preprocess(&io, on_stage)
        .with_context(|| format!("encode {}", dataset.display()))?;
    info!(
        work_dir = %work.root().display(),
        duration_ms = start.elapsed().as_millis(),
        "encode complete"
    );
    Ok(PipelineResult { reports })
}

/// Runs the decode stage when the output config's `processors.post_csv` is
/// enabled. `generated` defaults to the working directory's generated data.
pub fn decode_generated(
    work: &WorkDir,
    generated: Option<&Path>,
    options: DecodeOptions,
    on_stage: impl FnMut(&str),
) -> Result<PipelineResult> {
    let config_path = work.output_config();
    let config = load_config(&config_path).context("load output config")?;
    let plan = StagePlan::from_toggles(config.processors(), options);
    if !plan.has_postprocess() {
        warn!("decode stage disabled by processors.post_csv");
        return Ok(PipelineResult::default());
    }

    let input = generated.map_or_else(|| work.generated(), Path::to_path_buf);
    let span = info_span!("decode", generated = %input.display());
    let _guard = span.enter();
    let start = Instant::now();
    let io = StageIo::new(&input, &config_path, work.post_processed());
    let reports = plan
        .run_postprocess(&io, on_stage)
        .with_context(|| format!("decode {}", input.display()))?;
    info!(
        output = %work.final_output().display(),
        duration_ms = start.elapsed().as_millis(),
        "decode complete"
    );
    Ok(PipelineResult { reports })
}

/// Encodes `dataset`, decodes the encoded table as the generated table and
/// compares every declared column with the input.
pub fn run_roundtrip(
    dataset: &Path,
    config_path: &Path,
    work: &WorkDir,
    mut on_stage: impl FnMut(&str),
) -> Result<RoundtripResult> {
    let mut reports = encode_dataset(dataset, config_path, work, &mut on_stage)?.reports;

    let generated = work.generated().join(ENCODED_FILE);
    std::fs::copy(work.encoded_csv(), &generated)
        .with_context(|| format!("copy encoded table to {}", generated.display()))?;
    debug!(path = %generated.display(), "staged encoded table as generated data");

    reports.extend(
        decode_generated(work, Some(&generated), DecodeOptions::default(), &mut on_stage)?
            .reports,
    );

    let config = load_config(config_path).context("load config")?;
    let raw = read_dataset(dataset, config.input_format()).context("read dataset")?;
    let decoded = read_csv_text(&work.final_output()).context("read final output")?;
    let columns = compare_columns(&config, &raw, &decoded)?;
    Ok(RoundtripResult { reports, columns })
}

/// Compares each declared column's sorted values between two tables.
pub fn compare_columns(
    config: &CodecConfig,
    raw: &DataFrame,
    decoded: &DataFrame,
) -> Result<Vec<ColumnCheck>> {
    let mut checks = Vec::with_capacity(config.fields().len());
    for field in config.fields() {
        let status = if decoded.column(&field.name).is_err() || raw.column(&field.name).is_err() {
            ColumnStatus::Missing
        } else {
            let mut expected = sorted_cells(raw, &field.name)?;
            let mut actual = sorted_cells(decoded, &field.name)?;
            expected.resize(expected.len().max(actual.len()), String::new());
            actual.resize(expected.len(), String::new());
            let differing: Vec<(String, String)> = expected
                .into_iter()
                .zip(actual)
                .filter(|(e, a)| e != a)
                .collect();
            match differing.first() {
                None => ColumnStatus::Matched,
                Some(first) => ColumnStatus::Differs {
                    count: differing.len(),
                    example: Some(first.clone()),
                },
            }
        };
        checks.push(ColumnCheck {
            column: field.name.clone(),
            status,
        });
    }
    Ok(checks)
}

fn sorted_cells(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let mut cells: Vec<String> = column_cells(df, column)?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    cells.sort_unstable();
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;
    use serde_json::json;

    #[test]
    fn test_work_dir_layout() {
        let work = WorkDir::new("/tmp/run");
        assert_eq!(
            work.encoded_csv(),
            PathBuf::from("/tmp/run/pre_processed_data/encoded.csv")
        );
        assert_eq!(
            work.output_config(),
            PathBuf::from("/tmp/run/pre_processed_data/config.json")
        );
        assert_eq!(work.generated(), PathBuf::from("/tmp/run/generated_data"));
        assert_eq!(
            work.final_output(),
            PathBuf::from("/tmp/run/post_processed_data/final_output.csv")
        );
    }

    #[test]
    fn test_compare_columns_ignores_row_order() {
        let config = CodecConfig::from_value(json!({
            "fields": {
                "metadata": [
                    {"name": "proto", "format": "string"},
                    {"name": "dstport", "format": "integer", "encoding": "bit"},
                    {"name": "srcip", "format": "IP", "type": "IPv4"}
                ]
            }
        }))
        .unwrap();
        let raw = df! {
            "proto" => &["udp", "tcp"],
            "dstport" => &["-1", "80"],
            "srcip" => &["10.0.0.1", "10.0.0.2"],
        }
        .unwrap();
        let decoded = df! {
            "proto" => &["tcp", "udp"],
            "dstport" => &["0", "80"],
        }
        .unwrap();
        let checks = compare_columns(&config, &raw, &decoded).unwrap();
        assert_eq!(checks[0].status, ColumnStatus::Matched);
        assert_eq!(
            checks[1].status,
            ColumnStatus::Differs {
                count: 1,
                example: Some(("-1".to_string(), "0".to_string())),
            }
        );
        assert_eq!(checks[2].status, ColumnStatus::Missing);
    }
}
