//! Errors of the scenario pipeline.

use std::path::PathBuf;

use thiserror::Error;

use carbonlab_meter::MeterError;

/// Errors of the scenario pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required input files are absent from the data directory.
    #[error("missing data files: {}. Make sure they are located in {}", .files.join(", "), .dir.display())]
    MissingFiles {
        /// Data directory.
        dir: PathBuf,
        /// Names of the missing files.
        files: Vec<String>,
    },
    /// A required column is absent from a table.
    #[error("table {table} has no column {column}")]
    MissingColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
    /// A column to append does not have one value per row.
    #[error("column {column} of table {table} has {actual} value(s), expected {expected}")]
    ColumnLength {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Number of table rows.
        expected: usize,
        /// Number of values given.
        actual: usize,
    },
    /// A table or output file could not be read or written.
    #[error("cannot process {path}: {source}")]
    Csv {
        /// File path.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: csv::Error,
    },
    /// Unknown scenario mode.
    #[error("mode must be 'baseline' or 'optimized', got '{0}'")]
    InvalidMode(String),
    /// The workload could not be trained.
    #[error("workload failed: {0}")]
    Workload(String),
    /// Failure of the measurement subsystem.
    #[error(transparent)]
    Meter(#[from] MeterError),
}

impl PipelineError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv {
            path: path.into(),
            source,
        }
    }
}
