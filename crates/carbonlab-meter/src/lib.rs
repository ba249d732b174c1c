#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod impact;
pub mod intensity;
pub mod ledger;
pub mod measure;
pub mod power;
pub mod record;

pub use config::RunConfig;
pub use error::MeterError;
pub use intensity::{select, CarbonSample, SelectionResult};
pub use ledger::Ledger;
pub use measure::Meter;
pub use record::MeasurementRecord;
