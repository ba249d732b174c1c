//! Running a single scenario end to end.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;

use carbonlab_meter::intensity::{median_intensity, select, SelectionResult};
use carbonlab_meter::record::{BASELINE, OPTIMIZED};
use carbonlab_meter::{Ledger, MeasurementRecord, Meter, MeterError, RunConfig};

use crate::dataset::{carbon_samples, load_and_merge};
use crate::error::PipelineError;
use crate::submission::write_submission;
use crate::table::Table;
use crate::workload::train_and_predict;

const PREVIEW_ROWS: usize = 3;

/// Scenario to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Run at the median grid carbon intensity.
    Baseline,
    /// Run in the lowest carbon-intensity window.
    Optimized,
}

impl Mode {
    /// Scenario name used as the ledger key.
    pub fn scenario(&self) -> &'static str {
        match self {
            Mode::Baseline => BASELINE,
            Mode::Optimized => OPTIMIZED,
        }
    }

    /// Name of the submission file written by this mode.
    pub fn submission_file(&self) -> &'static str {
        match self {
            Mode::Baseline => "submission_baseline.csv",
            Mode::Optimized => "submission_optimized.csv",
        }
    }
}

impl FromStr for Mode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" => Ok(Mode::Baseline),
            "optimized" => Ok(Mode::Optimized),
            _ => Err(PipelineError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scenario())
    }
}

/// Outcome of [`run_mode`].
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// The record committed to the ledger.
    pub record: MeasurementRecord,
    /// Path of the written submission file.
    pub submission_path: PathBuf,
    /// Path of the ledger file.
    pub ledger_path: PathBuf,
}

/// Runs the workload in the given mode, writes its submission and commits its measurement.
///
/// Input files are checked before anything is measured. The ledger is read from the output
/// directory, an unreadable ledger being replaced with a fresh one.
pub fn run_mode(mode: Mode, config: &RunConfig) -> Result<RunSummary, PipelineError> {
    config.validate()?;
    let dataset = load_and_merge(&config.data_dir, config.seed)?;
    let samples = carbon_samples(&dataset.meta);

    let window = match mode {
        Mode::Baseline => SelectionResult {
            carbon_intensity: median_intensity(&samples),
            ..SelectionResult::empty()
        },
        Mode::Optimized => {
            let window = select(&samples, config.region.as_deref());
            if window.is_empty() {
                info!("[{}] no carbon-intensity window available", mode);
            } else {
                info!(
                    "[{}] picked region={} hour={} ci={}",
                    mode,
                    window.region.as_deref().unwrap_or("-"),
                    window.hour_bucket.map_or("-".to_string(), |h| h.to_string()),
                    window.carbon_intensity.unwrap_or_default()
                );
            }
            window
        }
    };

    let meter = Meter::new(config.proxy_model());
    let selection = match mode {
        Mode::Baseline => None,
        Mode::Optimized => Some(&window),
    };
    let (output, record) = meter.measure(
        || train_and_predict(&dataset, config.seed),
        window.carbon_intensity,
        mode.scenario(),
        selection,
    )?;
    let record = record.with_error_metric(output.mae);

    fs::create_dir_all(&config.output_dir).map_err(|e| MeterError::Io {
        path: config.output_dir.clone(),
        source: e,
    })?;
    let submission_path = config.output_dir.join(mode.submission_file());
    write_submission(&submission_path, &dataset.test, &output.predictions)?;
    info!("[{}] saved submission -> {}", mode, submission_path.display());

    let ledger_path = config.ledger_path();
    let mut ledger = Ledger::load_or_empty(&ledger_path);
    let record = ledger.upsert(record).clone();
    ledger.persist(&ledger_path)?;
    for line in preview(&ledger_path, &config.output_dir) {
        info!("[preview] {}", line);
    }

    info!(
        "[{}] CI={} Runtime={:.2}s Energy={:.6} kWh CO2={:.6} kg CO2_Reduction={:.2}%",
        mode,
        record
            .carbon_intensity
            .map_or("None".to_string(), |ci| ci.to_string()),
        record.runtime_seconds,
        record.energy_kwh,
        record.co2e_kg,
        record.co2_reduction_percent.unwrap_or_default()
    );

    Ok(RunSummary {
        record,
        submission_path,
        ledger_path,
    })
}

/// Renders the first rows of the ledger and of both submission files.
///
/// Missing or unreadable files produce a single line saying so.
pub fn preview(ledger_path: &Path, output_dir: &Path) -> Vec<String> {
    let paths = [
        ledger_path.to_path_buf(),
        output_dir.join(Mode::Baseline.submission_file()),
        output_dir.join(Mode::Optimized.submission_file()),
    ];
    let mut lines = Vec::new();
    for path in paths.iter() {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        if !path.exists() {
            lines.push(format!("{} not found", name));
            continue;
        }
        match Table::read(path) {
            Ok(table) => {
                lines.push(format!("{} ({} rows)", name, table.len()));
                lines.push(table.headers().join(","));
                for row in 0..table.len().min(PREVIEW_ROWS) {
                    let cells: Vec<&str> = (0..table.headers().len())
                        .map(|col| table.cell(row, col))
                        .collect();
                    lines.push(cells.join(","));
                }
            }
            Err(e) => lines.push(format!("cannot preview {}: {}", name, e)),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!("baseline".parse::<Mode>().unwrap(), Mode::Baseline);
        assert_eq!("Optimized".parse::<Mode>().unwrap(), Mode::Optimized);
        assert!(matches!("fast".parse::<Mode>(), Err(PipelineError::InvalidMode(m)) if m == "fast"));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::Baseline.to_string(), "Baseline");
        assert_eq!(Mode::Optimized.submission_file(), "submission_optimized.csv");
    }
}
