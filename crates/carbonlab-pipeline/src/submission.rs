//! Submission files with one prediction per test row.

use std::path::Path;

use crate::error::PipelineError;
use crate::table::Table;

const ID_CANDIDATES: [&str; 4] = ["row_id", "Id", "id", "index"];
const GENERATED_ID: &str = "row_id";
const PREDICTION_COLUMN: &str = "target";

/// Writes `predictions` for the rows of `test` to `path`.
///
/// Rows are identified by the first of `row_id`, `Id`, `id`, `index` present in the test table,
/// otherwise by a generated `row_id` counting from zero.
pub fn write_submission(path: &Path, test: &Table, predictions: &[f64]) -> Result<(), PipelineError> {
    let id_column = ID_CANDIDATES
        .iter()
        .find_map(|c| test.column_index(c).map(|idx| (*c, idx)));
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    let header = id_column.map_or(GENERATED_ID, |(name, _)| name);
    writer
        .write_record([header, PREDICTION_COLUMN])
        .map_err(|e| PipelineError::csv(path, e))?;
    for (row, prediction) in predictions.iter().enumerate() {
        let id = match id_column {
            Some((_, idx)) => test.cell(row, idx).to_string(),
            None => row.to_string(),
        };
        writer
            .write_record([id, prediction.to_string()])
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::csv(path, e.into()))
}
