#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod submission;
pub mod table;
pub mod workload;

pub use error::PipelineError;
pub use pipeline::{preview, run_mode, Mode, RunSummary};
