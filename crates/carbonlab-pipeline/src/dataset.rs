//! Loading of the training, test and carbon-intensity metadata tables.

use std::collections::BTreeSet;
use std::path::Path;

use log::{info, warn};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;

use carbonlab_meter::CarbonSample;

use crate::error::PipelineError;
use crate::table::Table;

/// Training table file name.
pub const TRAIN_FILE: &str = "train.csv";
/// Test table file name.
pub const TEST_FILE: &str = "test.csv";
/// Carbon-intensity metadata file name.
pub const META_FILE: &str = "metaData.csv";

/// Region column of the metadata table.
pub const REGION_COLUMN: &str = "region";
/// Hour-of-day column of the metadata table.
pub const HOUR_COLUMN: &str = "UTC_hour";
/// Carbon-intensity column of the metadata table, gCO2/kWh.
pub const INTENSITY_COLUMN: &str = "carbon_intensity_gco2_per_kwh";

const TARGET_CANDIDATES: [&str; 3] = ["target", "Target", "y"];
const SYNTHETIC_TARGET: &str = "target";
const NON_FEATURE_COLUMNS: [&str; 6] = ["example_id", "ExampleId", "Id", "id", "row_id", "index"];

/// Input tables of a run.
pub struct Dataset {
    /// Training table; always carries the target column.
    pub train: Table,
    /// Test table.
    pub test: Table,
    /// Carbon-intensity metadata table.
    pub meta: Table,
    /// Feature columns, sorted by name.
    pub feature_columns: Vec<String>,
    /// Name of the target column in the training table.
    pub target_column: String,
}

/// Reads the input tables of `data_dir` and determines the target and feature columns.
///
/// Fails before reading anything if any of the input files is missing. A training table without a
/// target column gets a synthetic Normal(50, 5) target drawn with `seed`.
pub fn load_and_merge(data_dir: &Path, seed: u64) -> Result<Dataset, PipelineError> {
    let missing: Vec<String> = [TRAIN_FILE, TEST_FILE, META_FILE]
        .iter()
        .filter(|f| !data_dir.join(f).exists())
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingFiles {
            dir: data_dir.to_path_buf(),
            files: missing,
        });
    }

    let mut train = Table::read(&data_dir.join(TRAIN_FILE))?;
    let test = Table::read(&data_dir.join(TEST_FILE))?;
    let meta = Table::read(&data_dir.join(META_FILE))?;

    let target_column = match TARGET_CANDIDATES.iter().find(|c| train.has_column(c)) {
        Some(column) => column.to_string(),
        None => {
            warn!("[dataset] {} has no target column, generating synthetic target", TRAIN_FILE);
            let mut rng = Pcg64::seed_from_u64(seed);
            let normal = Normal::new(50., 5.).map_err(|e| PipelineError::Workload(e.to_string()))?;
            let values = (0..train.len())
                .map(|_| normal.sample(&mut rng).to_string())
                .collect();
            train.push_column(SYNTHETIC_TARGET, values)?;
            SYNTHETIC_TARGET.to_string()
        }
    };

    let is_feature = |c: &&String| **c != target_column && !NON_FEATURE_COLUMNS.contains(&c.as_str());
    let train_columns: BTreeSet<&String> = train.headers().iter().filter(is_feature).collect();
    let test_columns: BTreeSet<&String> = test.headers().iter().collect();
    let mut feature_columns: Vec<String> = train_columns
        .intersection(&test_columns)
        .map(|c| c.to_string())
        .collect();
    if feature_columns.is_empty() {
        feature_columns = train_columns.iter().map(|c| c.to_string()).collect();
    }
    info!(
        "[dataset] train={} test={} meta={} rows, {} feature(s), target '{}'",
        train.len(),
        test.len(),
        meta.len(),
        feature_columns.len(),
        target_column
    );

    Ok(Dataset {
        train,
        test,
        meta,
        feature_columns,
        target_column,
    })
}

/// Extracts carbon-intensity samples from the metadata table.
///
/// Returns no samples if the table has no intensity column. Rows with an empty, non-numeric or
/// negative intensity are skipped. Hours outside 0-23 are kept as unknown.
pub fn carbon_samples(meta: &Table) -> Vec<CarbonSample> {
    let intensity = match meta.column_index(INTENSITY_COLUMN) {
        Some(idx) => idx,
        None => {
            warn!("[dataset] {} has no column {}", meta.name(), INTENSITY_COLUMN);
            return Vec::new();
        }
    };
    let region = meta.column_index(REGION_COLUMN);
    let hour = meta.column_index(HOUR_COLUMN);

    let mut samples = Vec::with_capacity(meta.len());
    let mut skipped = 0;
    for row in 0..meta.len() {
        let value = match meta.cell(row, intensity).parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0. => v,
            _ => {
                skipped += 1;
                continue;
            }
        };
        samples.push(CarbonSample {
            region: region.map(|c| meta.cell(row, c).to_string()),
            hour_bucket: hour.and_then(|c| parse_hour(meta.cell(row, c))),
            carbon_intensity: value,
        });
    }
    if skipped > 0 {
        warn!("[dataset] skipped {} row(s) without valid carbon intensity", skipped);
    }
    samples
}

fn parse_hour(cell: &str) -> Option<u32> {
    let hour = cell.parse::<f64>().ok()?;
    if hour.fract() == 0. && (0. ..24.).contains(&hour) {
        Some(hour as u32)
    } else {
        None
    }
}
