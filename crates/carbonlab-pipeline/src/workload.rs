//! Reference workload: a regression model trained on the training table.

use std::collections::BTreeMap;

use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::table::Table;

const HOLDOUT_FRACTION: f64 = 0.2;
const EPOCHS: usize = 500;
const LEARNING_RATE: f64 = 0.05;
const L2_PENALTY: f64 = 1e-3;

/// Kind of a feature column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-empty cell parses as a number.
    Numeric,
    /// Anything else.
    Categorical,
}

#[derive(Clone, Debug)]
enum Encoder {
    Numeric { median: f64, mean: f64, scale: f64 },
    Categorical { fill: String, categories: Vec<String> },
}

impl Encoder {
    fn width(&self) -> usize {
        match self {
            Encoder::Numeric { .. } => 1,
            Encoder::Categorical { categories, .. } => categories.len(),
        }
    }

    fn encode(&self, cell: &str, out: &mut Vec<f64>) {
        match self {
            Encoder::Numeric { median, mean, scale } => {
                let x = cell.parse::<f64>().unwrap_or(*median);
                out.push((x - mean) / scale);
            }
            Encoder::Categorical { fill, categories } => {
                let value = if cell.is_empty() { fill.as_str() } else { cell };
                let hit = categories.binary_search_by(|c| c.as_str().cmp(value)).ok();
                out.extend((0..categories.len()).map(|i| if Some(i) == hit { 1. } else { 0. }));
            }
        }
    }
}

/// Imputes, scales and one-hot encodes raw feature rows.
///
/// Numeric columns: missing values are replaced with the median, then standardized. Categorical
/// columns: missing values are replaced with the most frequent value, then one-hot encoded;
/// categories not seen during fitting encode as all zeros.
#[derive(Clone, Debug)]
pub struct Preprocessor {
    encoders: Vec<Encoder>,
}

impl Preprocessor {
    /// Fits the encoders on `rows`, one cell per column in `kinds` order.
    pub fn fit(kinds: &[ColumnKind], rows: &[Vec<&str>]) -> Self {
        let encoders = kinds
            .iter()
            .enumerate()
            .map(|(col, kind)| {
                let cells = rows.iter().map(|r| r[col]);
                match kind {
                    ColumnKind::Numeric => fit_numeric(cells),
                    ColumnKind::Categorical => fit_categorical(cells),
                }
            })
            .collect();
        Self { encoders }
    }

    /// Number of encoded values per row.
    pub fn width(&self) -> usize {
        self.encoders.iter().map(Encoder::width).sum()
    }

    /// Encodes a raw row.
    pub fn transform(&self, row: &[&str]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        for (encoder, cell) in self.encoders.iter().zip(row) {
            encoder.encode(cell, &mut out);
        }
        out
    }
}

fn fit_numeric<'a>(cells: impl Iterator<Item = &'a str>) -> Encoder {
    let cells: Vec<Option<f64>> = cells.map(|c| c.parse::<f64>().ok()).collect();
    let mut present: Vec<f64> = cells.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));
    let median = match present.len() {
        0 => 0.,
        n if n % 2 == 0 => (present[n / 2 - 1] + present[n / 2]) / 2.,
        n => present[n / 2],
    };
    let imputed: Vec<f64> = cells.iter().map(|c| c.unwrap_or(median)).collect();
    let n = imputed.len().max(1) as f64;
    let mean = imputed.iter().sum::<f64>() / n;
    let std = (imputed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    Encoder::Numeric {
        median,
        mean,
        scale: if std > 0. { std } else { 1. },
    }
}

fn fit_categorical<'a>(cells: impl Iterator<Item = &'a str>) -> Encoder {
    let cells: Vec<&str> = cells.collect();
    let mut counts = BTreeMap::<&str, usize>::new();
    for cell in cells.iter().filter(|c| !c.is_empty()) {
        *counts.entry(*cell).or_default() += 1;
    }
    // BTreeMap iterates in order, so ties go to the smallest value
    let mut fill = "";
    let mut best = 0;
    for (&value, &count) in counts.iter() {
        if count > best {
            fill = value;
            best = count;
        }
    }
    let mut categories: Vec<String> = counts.keys().map(|c| c.to_string()).collect();
    if cells.iter().any(|c| c.is_empty()) && categories.is_empty() {
        categories.push(String::new());
    }
    Encoder::Categorical {
        fill: fill.to_string(),
        categories,
    }
}

/// Detects the kind of each feature column over the training and test tables.
pub fn column_kinds(dataset: &Dataset) -> Vec<ColumnKind> {
    dataset
        .feature_columns
        .iter()
        .map(|name| {
            let numeric = [&dataset.train, &dataset.test].iter().all(|table| match table.column_index(name) {
                Some(col) => table.column(col).all(|c| c.is_empty() || c.parse::<f64>().is_ok()),
                None => true,
            });
            if numeric {
                ColumnKind::Numeric
            } else {
                ColumnKind::Categorical
            }
        })
        .collect()
}

/// Raw feature cells of every row, empty for columns the table lacks.
pub fn feature_rows<'a>(table: &'a Table, columns: &[String]) -> Vec<Vec<&'a str>> {
    let indices: Vec<Option<usize>> = columns.iter().map(|c| table.column_index(c)).collect();
    (0..table.len())
        .map(|row| {
            indices
                .iter()
                .map(|idx| idx.map_or("", |col| table.cell(row, col)))
                .collect()
        })
        .collect()
}

/// Ridge-regularized linear regression fitted by full-batch gradient descent.
#[derive(Clone, Debug)]
pub struct LinearRegressor {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearRegressor {
    /// Fits the model on encoded rows `x` and targets `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Self {
        let width = x.first().map_or(0, Vec::len);
        let n = y.len().max(1) as f64;
        let mut model = Self {
            weights: vec![0.; width],
            bias: y.iter().sum::<f64>() / n,
        };
        let mut grad = vec![0.; width];
        for _ in 0..EPOCHS {
            grad.iter_mut().for_each(|g| *g = 0.);
            let mut grad_bias = 0.;
            for (row, target) in x.iter().zip(y) {
                let err = model.predict(row) - target;
                grad_bias += err;
                for (g, v) in grad.iter_mut().zip(row) {
                    *g += err * v;
                }
            }
            for (w, g) in model.weights.iter_mut().zip(grad.iter()) {
                *w -= LEARNING_RATE * (g / n + L2_PENALTY * *w);
            }
            model.bias -= LEARNING_RATE * grad_bias / n;
        }
        model
    }

    /// Predicts the target of an encoded row.
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.bias + self.weights.iter().zip(row).map(|(w, v)| w * v).sum::<f64>()
    }
}

/// Result of the reference workload.
#[derive(Clone, Debug)]
pub struct WorkloadOutput {
    /// Mean absolute error on the hold-out split.
    pub mae: f64,
    /// Predictions for every test row.
    pub predictions: Vec<f64>,
}

/// Trains the model on a shuffled 80% of the training rows, reports MAE on the remaining 20%, and
/// predicts the test table.
pub fn train_and_predict(dataset: &Dataset, seed: u64) -> Result<WorkloadOutput, PipelineError> {
    let target_col = dataset.train.require_column(&dataset.target_column)?;
    let mut y = Vec::with_capacity(dataset.train.len());
    for (row, cell) in dataset.train.column(target_col).enumerate() {
        let value = cell
            .parse::<f64>()
            .map_err(|_| PipelineError::Workload(format!("target value '{}' in row {} is not a number", cell, row)))?;
        y.push(value);
    }
    if y.len() < 2 {
        return Err(PipelineError::Workload(format!(
            "at least 2 training rows required, got {}",
            y.len()
        )));
    }

    let kinds = column_kinds(dataset);
    let train_rows = feature_rows(&dataset.train, &dataset.feature_columns);
    let test_rows = feature_rows(&dataset.test, &dataset.feature_columns);

    let mut order: Vec<usize> = (0..y.len()).collect();
    order.shuffle(&mut Pcg64::seed_from_u64(seed));
    let holdout = ((y.len() as f64 * HOLDOUT_FRACTION).ceil() as usize).clamp(1, y.len() - 1);
    let (valid_idx, fit_idx) = order.split_at(holdout);

    let fit_raw: Vec<Vec<&str>> = fit_idx.iter().map(|&i| train_rows[i].clone()).collect();
    let preprocessor = Preprocessor::fit(&kinds, &fit_raw);
    let fit_x: Vec<Vec<f64>> = fit_raw.iter().map(|r| preprocessor.transform(r)).collect();
    let fit_y: Vec<f64> = fit_idx.iter().map(|&i| y[i]).collect();
    let model = LinearRegressor::fit(&fit_x, &fit_y);

    let mae = valid_idx
        .iter()
        .map(|&i| (model.predict(&preprocessor.transform(&train_rows[i])) - y[i]).abs())
        .sum::<f64>()
        / valid_idx.len() as f64;
    debug!(
        "[workload] fitted on {} rows, {} encoded features, holdout MAE {:.4}",
        fit_idx.len(),
        preprocessor.width(),
        mae
    );

    let predictions = test_rows
        .iter()
        .map(|r| model.predict(&preprocessor.transform(r)))
        .collect();
    Ok(WorkloadOutput { mae, predictions })
}
