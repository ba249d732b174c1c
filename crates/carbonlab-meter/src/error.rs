//! Errors reported by the measurement primitives.

use std::path::PathBuf;

use thiserror::Error;

/// Errors of the measurement subsystem.
///
/// An empty carbon-intensity selection is not an error, see
/// [`SelectionResult::is_empty`](crate::intensity::SelectionResult::is_empty).
#[derive(Debug, Error)]
pub enum MeterError {
    /// A required input artifact (table, column, ledger row) is absent.
    #[error("missing data: {0}")]
    MissingData(String),
    /// The ledger file could not be read or written.
    #[error("ledger file {path} is unusable: {source}")]
    Persistence {
        /// Ledger file path.
        path: PathBuf,
        /// Underlying CSV or I/O failure.
        #[source]
        source: csv::Error,
    },
    /// I/O failure outside of CSV parsing (directory creation, rename).
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Invalid run configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MeterError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        MeterError::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeterError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_yaml::Error> for MeterError {
    fn from(value: serde_yaml::Error) -> Self {
        MeterError::Config(value.to_string())
    }
}
