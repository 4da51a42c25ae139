use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use trace_cli::job::{JobStatus, spawn_job};
use trace_cli::pipeline::{WorkDir, decode_generated, encode_dataset, run_roundtrip};
use trace_cli::types::{PipelineResult, RoundtripResult};
use trace_codec::DecodeOptions;
use trace_ingest::{load_config, observed_types, read_dataset};
use trace_model::Schema;

use crate::cli::{DecodeArgs, EncodeArgs, RoundtripArgs, SchemaArgs};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_schema(args: &SchemaArgs) -> Result<Schema> {
    let config = load_config(&args.config).context("load config")?;
    let table = read_dataset(&args.dataset, config.input_format())
        .with_context(|| format!("read {}", args.dataset.display()))?;
    let schema = Schema::resolve(config.fields().to_vec(), &observed_types(&table))
        .context("resolve schema")?;
    info!(
        fields = schema.len(),
        dropped = schema.dropped().len(),
        "schema resolved"
    );
    Ok(schema)
}

pub fn run_encode(args: &EncodeArgs) -> Result<PipelineResult> {
    let work = WorkDir::new(&args.work_dir);
    encode_dataset(&args.dataset, &args.config, &work, |_| {})
}

pub fn run_decode(args: &DecodeArgs) -> Result<PipelineResult> {
    let work = WorkDir::new(&args.work_dir);
    let options = DecodeOptions {
        on_cell_error: args.on_cell_error.into(),
    };
    let result = decode_generated(&work, args.generated.as_deref(), options, |_| {})?;
    if let Some(output) = &args.output
        && !result.reports.is_empty()
    {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::copy(work.final_output(), output)
            .with_context(|| format!("copy final output to {}", output.display()))?;
        info!(output = %output.display(), "final output copied");
    }
    Ok(result)
}

/// Runs the round trip on a background job and polls it until done.
pub fn run_roundtrip_job(args: &RoundtripArgs) -> Result<RoundtripResult> {
    let span = info_span!("roundtrip", dataset = %args.dataset.display());
    let _guard = span.enter();

    let dataset = args.dataset.clone();
    let config = args.config.clone();
    let work = WorkDir::new(&args.work_dir);
    let mut job = spawn_job("roundtrip", move |reporter| {
        run_roundtrip(&dataset, &config, &work, |stage| reporter.stage(stage))
    });

    let mut last = JobStatus::Pending;
    while job.is_alive() {
        let status = job.status().clone();
        if status != last {
            if let JobStatus::Running { stage } = &status {
                info!(stage = %stage, "roundtrip stage started");
            }
            last = status;
        }
        thread::sleep(POLL_INTERVAL);
    }
    job.wait()
}
