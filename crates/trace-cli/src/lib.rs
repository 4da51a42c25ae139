//! CLI library components for tracecodec.

pub mod job;
pub mod logging;
pub mod pipeline;
pub mod types;
