//! CLI argument definitions for tracecodec.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use trace_codec::CellErrorPolicy;

#[derive(Parser)]
#[command(
    name = "tracecodec",
    version,
    about = "Encode network traces for model training and decode generated traces",
    long_about = "Encode network trace tables into a model-ready form and decode \
                  generated tables back into the original shape.\n\n\
                  Encoding writes the encoded CSV and an output config carrying the \
                  changed-fields manifest and generation directives. Decoding reads \
                  that config, reconstructs the original columns and assigns flow ids."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve a config against a dataset and print the field schema.
    Schema(SchemaArgs),

    /// Encode a raw dataset into <WORK_DIR>/pre_processed_data.
    Encode(EncodeArgs),

    /// Decode a generated table into <WORK_DIR>/post_processed_data.
    Decode(DecodeArgs),

    /// Encode, decode the encoded table unchanged, and compare with the input.
    Roundtrip(RoundtripArgs),
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Raw dataset (CSV or JSON lines, per the config).
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Codec config (JSON).
    #[arg(long = "config", value_name = "FILE")]
    pub config: PathBuf,
}

#[derive(Parser)]
pub struct EncodeArgs {
    /// Raw dataset (CSV or JSON lines, per the config).
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Codec config (JSON).
    #[arg(long = "config", value_name = "FILE")]
    pub config: PathBuf,

    /// Working directory for stage inputs and outputs.
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: PathBuf,
}

#[derive(Parser)]
pub struct DecodeArgs {
    /// Working directory of a previous encode run.
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: PathBuf,

    /// Generated table or directory (default: <WORK_DIR>/generated_data).
    #[arg(long = "generated", value_name = "CSV|DIR")]
    pub generated: Option<PathBuf>,

    /// Also copy the final table to this path.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// How to handle generated cells that cannot be decoded.
    #[arg(long = "on-cell-error", value_enum, default_value = "fail")]
    pub on_cell_error: CellErrorArg,
}

#[derive(Parser)]
pub struct RoundtripArgs {
    /// Raw dataset (CSV or JSON lines, per the config).
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Codec config (JSON).
    #[arg(long = "config", value_name = "FILE")]
    pub config: PathBuf,

    /// Working directory for stage inputs and outputs.
    #[arg(long = "work-dir", value_name = "DIR")]
    pub work_dir: PathBuf,
}

/// CLI cell error policy choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum CellErrorArg {
    Fail,
    Null,
}

impl From<CellErrorArg> for CellErrorPolicy {
    fn from(arg: CellErrorArg) -> Self {
        match arg {
            CellErrorArg::Fail => CellErrorPolicy::Fail,
            CellErrorArg::Null => CellErrorPolicy::Null,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
