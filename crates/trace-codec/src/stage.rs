//! File-based pre- and post-processing stages.
//!
//! A stage reads its input table and config from disk and writes its results
//! into an output directory. [`StagePlan`] runs the enabled stages in order.
//!
//! # Stage Order
//!
//! 1. **CsvEncodeStage** - raw dataset to `encoded.csv` plus `config.json`
//! 2. *(external model produces the generated table)*
//! 3. **CsvDecodeStage** - generated table to `final_output.csv`

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use trace_ingest::{
    load_config, observed_types, read_csv_text, read_dataset, resolve_csv, write_csv, write_json,
};
use trace_model::{DroppedField, ProcessorToggles, Schema};
use tracing::{debug, info, info_span, warn};

use crate::decoder::{DecodeManifest, DecodeOptions, decode};
use crate::encoder::{FieldStats, encode};
use crate::error::{CellError, Result};
use crate::output_config::build_output_config;

pub const ENCODED_FILE: &str = "encoded.csv";
pub const OUTPUT_CONFIG_FILE: &str = "config.json";
pub const FINAL_OUTPUT_FILE: &str = "final_output.csv";

/// Paths a stage reads from and writes to.
#[derive(Debug, Clone)]
pub struct StageIo {
    /// Input table: the raw dataset for preprocessing, the generated table
    /// (file or directory) for postprocessing.
    pub input: PathBuf,
    /// Input config for preprocessing, output config for postprocessing.
    pub config: PathBuf,
    pub output_dir: PathBuf,
}

impl StageIo {
    pub fn new(
        input: impl Into<PathBuf>,
        config: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            config: config.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }
}

/// Stage-specific outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSummary {
    Encoded {
        fields: Vec<FieldStats>,
        dropped: Vec<DroppedField>,
    },
    Decoded {
        flows: usize,
        cell_errors: Vec<CellError>,
        ignored: Vec<String>,
    },
}

/// What a stage did.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub input: PathBuf,
    /// Primary output table.
    pub output: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub summary: StageSummary,
}

/// Stage run before the external model.
pub trait Preprocess: Send + Sync {
    fn name(&self) -> &str;

    fn preprocess(&self, io: &StageIo) -> Result<StageReport>;
}

/// Stage run on the external model's output.
pub trait Postprocess: Send + Sync {
    fn name(&self) -> &str;

    fn postprocess(&self, io: &StageIo) -> Result<StageReport>;
}

/// Encodes a raw dataset and writes the encoded CSV and output config.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvEncodeStage;

impl Preprocess for CsvEncodeStage {
    fn name(&self) -> &str {
        "encode"
    }

    fn preprocess(&self, io: &StageIo) -> Result<StageReport> {
        let config = load_config(&io.config)?;
        let table = read_dataset(&io.input, config.input_format())?;
        debug!(
            rows = table.height(),
            columns = table.width(),
            "loaded raw dataset"
        );

        let schema = Schema::resolve(config.fields().to_vec(), &observed_types(&table))?;
        for dropped in schema.dropped() {
            warn!(
                field = %dropped.name,
                declared = %dropped.declared,
                observed = %dropped.observed,
                "dropping field with incompatible column type"
            );
        }

        let output = encode(&schema, &table)?;
        let encoded_path = io.output_path(ENCODED_FILE);
        write_csv(&output.table, &encoded_path)?;
        let output_config = build_output_config(&config, &schema, &output, &encoded_path)?;
        write_json(&io.output_path(OUTPUT_CONFIG_FILE), &output_config)?;

        Ok(StageReport {
            stage: self.name().to_string(),
            input: io.input.clone(),
            output: encoded_path,
            rows: output.table.height(),
            columns: output.table.width(),
            summary: StageSummary::Encoded {
                fields: output.stats,
                dropped: schema.dropped().to_vec(),
            },
        })
    }
}

/// Decodes a generated table and writes the final CSV.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvDecodeStage {
    pub options: DecodeOptions,
}

impl CsvDecodeStage {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }
}

impl Postprocess for CsvDecodeStage {
    fn name(&self) -> &str {
        "decode"
    }

    fn postprocess(&self, io: &StageIo) -> Result<StageReport> {
        let config = load_config(&io.config)?;
        let manifest = DecodeManifest::from_config(&config)?;
        let generated_path = resolve_csv(&io.input)?;
        let generated = read_csv_text(&generated_path)?;
        debug!(
            path = %generated_path.display(),
            rows = generated.height(),
            "loaded generated table"
        );

        let output = decode(&manifest, &generated, &self.options)?;
        let final_path = io.output_path(FINAL_OUTPUT_FILE);
        write_csv(&output.table, &final_path)?;

        Ok(StageReport {
            stage: self.name().to_string(),
            input: generated_path,
            output: final_path,
            rows: output.table.height(),
            columns: output.table.width(),
            summary: StageSummary::Decoded {
                flows: output.flow_count,
                cell_errors: output.cell_errors,
                ignored: output.ignored_columns,
            },
        })
    }
}

/// Ordered pre- and post-processing stages.
#[derive(Default)]
pub struct StagePlan {
    preprocessors: Vec<Box<dyn Preprocess>>,
    postprocessors: Vec<Box<dyn Postprocess>>,
}

impl StagePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// The CSV stages enabled by `toggles`.
    pub fn from_toggles(toggles: ProcessorToggles, options: DecodeOptions) -> Self {
        let mut plan = Self::new();
        if toggles.pre_csv {
            plan = plan.add_preprocess(Box::new(CsvEncodeStage));
        }
        if toggles.post_csv {
            plan = plan.add_postprocess(Box::new(CsvDecodeStage::new(options)));
        }
        plan
    }

    pub fn add_preprocess(mut self, stage: Box<dyn Preprocess>) -> Self {
        self.preprocessors.push(stage);
        self
    }

    pub fn add_postprocess(mut self, stage: Box<dyn Postprocess>) -> Self {
        self.postprocessors.push(stage);
        self
    }

    pub fn has_preprocess(&self) -> bool {
        !self.preprocessors.is_empty()
    }

    pub fn has_postprocess(&self) -> bool {
        !self.postprocessors.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.preprocessors
            .iter()
            .map(|s| s.name())
            .chain(self.postprocessors.iter().map(|s| s.name()))
            .collect()
    }

    /// Runs every preprocessor. `on_stage` is called before each one starts.
    pub fn run_preprocess(
        &self,
        io: &StageIo,
        mut on_stage: impl FnMut(&str),
    ) -> Result<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(self.preprocessors.len());
        for stage in &self.preprocessors {
            on_stage(stage.name());
            reports.push(run_timed(stage.name(), &io.input, || stage.preprocess(io))?);
        }
        Ok(reports)
    }

    /// Runs every postprocessor. `on_stage` is called before each one starts.
    pub fn run_postprocess(
        &self,
        io: &StageIo,
        mut on_stage: impl FnMut(&str),
    ) -> Result<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(self.postprocessors.len());
        for stage in &self.postprocessors {
            on_stage(stage.name());
            reports.push(run_timed(stage.name(), &io.input, || stage.postprocess(io))?);
        }
        Ok(reports)
    }
}

fn run_timed(
    name: &str,
    input: &Path,
    run: impl FnOnce() -> Result<StageReport>,
) -> Result<StageReport> {
    info_span!("stage", stage = name).in_scope(|| {
        let start = Instant::now();
        let report = run()?;
        info!(
            input = %input.display(),
            output = %report.output.display(),
            rows = report.rows,
            columns = report.columns,
            "stage complete"
        );
        debug!(duration_ms = start.elapsed().as_millis(), "stage timing");
        Ok(report)
    })
}
