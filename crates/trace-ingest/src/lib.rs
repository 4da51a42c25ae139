//! Trace dataset ingestion and output.
//!
//! Reads raw datasets (CSV or JSON lines) with dtype inference, reads
//! generated tables as text, writes CSV, and loads codec configs.

pub mod config;
pub mod discovery;
pub mod error;
pub mod jsonl;
pub mod polars_utils;
pub mod reader;
pub mod writer;

use std::path::Path;

use polars::prelude::DataFrame;
use trace_model::InputFormat;

pub use config::{load_config, write_json};
pub use discovery::{list_csv_files, resolve_csv};
pub use error::{IngestError, Result};
pub use jsonl::read_json_lines;
pub use polars_utils::{
    any_to_f64, any_to_i64, any_to_string, column_cells, format_numeric, observed_type,
    observed_types, parse_f64, parse_i64,
};
pub use reader::{check_file_size, read_csv_table, read_csv_text};
pub use writer::write_csv;

/// Reads a raw dataset in the layout named by the config.
pub fn read_dataset(path: &Path, format: InputFormat) -> Result<DataFrame> {
    match format {
        InputFormat::Csv => read_csv_table(path),
        InputFormat::JsonLines => read_json_lines(path),
    }
}
