//! Bidirectional field codec for network trace tables.
//!
//! The encoder turns a raw trace table into a model-ready table plus a
//! changed-fields manifest and generation directives. The decoder uses the
//! manifest to turn a generated table back into the raw shape and assigns
//! flow identifiers.

pub mod abnormal;
pub mod address;
pub mod column;
pub mod composite;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod flow;
pub mod output_config;
pub mod stage;
pub mod timestamp;

pub use abnormal::{AbnormalPolicy, SweepMode, is_sentinel};
pub use address::{decode_address, encode_address};
pub use column::{ColumnValues, EncodedColumn};
pub use decoder::{CellErrorPolicy, DecodeManifest, DecodeOptions, DecodeOutput, decode};
pub use encoder::{EncodeOutput, FieldStats, encode};
pub use error::{CellError, CodecError, Result};
pub use flow::{FlowAssignment, assign_flow_ids};
pub use output_config::build_output_config;
pub use stage::{
    CsvDecodeStage, CsvEncodeStage, ENCODED_FILE, FINAL_OUTPUT_FILE, OUTPUT_CONFIG_FILE,
    Postprocess, Preprocess, StageIo, StagePlan, StageReport, StageSummary,
};
pub use timestamp::{TICKS_PER_SECOND, format_ticks, parse_ticks};
