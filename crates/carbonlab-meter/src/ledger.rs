//! Persistent metrics ledger with one record per scenario.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{info, warn};

use crate::error::MeterError;
use crate::record::{MeasurementRecord, BASELINE, OPTIMIZED};

/// Default ledger file name.
pub const LEDGER_FILE_NAME: &str = "metrics_before_after.csv";

/// Ordered store of measurement records keyed by scenario name.
///
/// Holds at most one record per scenario. A write for an existing scenario replaces the old record
/// and moves it to the end, so iteration order reflects the latest writes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    records: IndexMap<String, MeasurementRecord>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from records in file order, later records replacing earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = MeasurementRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.insert(record);
        }
        ledger
    }

    /// Number of stored scenarios.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record of the given scenario.
    pub fn get(&self, scenario: &str) -> Option<&MeasurementRecord> {
        self.records.get(scenario)
    }

    /// Iterates over records in ledger order.
    pub fn records(&self) -> impl Iterator<Item = &MeasurementRecord> {
        self.records.values()
    }

    /// Returns the most recent baseline record, scenario names compared case-insensitively.
    pub fn baseline(&self) -> Option<&MeasurementRecord> {
        self.records.values().rev().find(|r| r.is_baseline())
    }

    /// Returns the most recent optimized record, scenario names compared case-insensitively.
    pub fn optimized(&self) -> Option<&MeasurementRecord> {
        self.records.values().rev().find(|r| r.is_optimized())
    }

    /// Commits a new record, replacing any record of the same scenario.
    ///
    /// The CO2 reduction of the record is computed against the baseline currently held by the
    /// ledger: for an optimized record with a baseline of positive CO2 it is
    /// `(baseline - optimized) / baseline * 100`, otherwise 0. Records already in the ledger are
    /// never updated retroactively.
    pub fn upsert(&mut self, mut record: MeasurementRecord) -> &MeasurementRecord {
        let reduction = match self.baseline() {
            Some(baseline) if record.is_optimized() && baseline.co2e_kg > 0. => {
                (baseline.co2e_kg - record.co2e_kg) / baseline.co2e_kg * 100.
            }
            _ => 0.,
        };
        record.co2_reduction_percent = Some(reduction);
        self.insert(record)
    }

    fn insert(&mut self, record: MeasurementRecord) -> &MeasurementRecord {
        self.records.shift_remove(&record.scenario);
        let (idx, _) = self.records.insert_full(record.scenario.clone(), record);
        &self.records[idx]
    }

    /// Returns the baseline and optimized records used for impact projection.
    pub fn scenario_pair(&self) -> Result<(&MeasurementRecord, &MeasurementRecord), MeterError> {
        let baseline = self
            .baseline()
            .ok_or_else(|| MeterError::MissingData(format!("no {} record in ledger", BASELINE)))?;
        let optimized = self
            .optimized()
            .ok_or_else(|| MeterError::MissingData(format!("no {} record in ledger", OPTIMIZED)))?;
        Ok((baseline, optimized))
    }

    /// Reads ledger from CSV file.
    ///
    /// A missing file yields an empty ledger. Duplicate scenarios in the file are collapsed, the
    /// last row winning.
    pub fn load(path: &Path) -> Result<Self, MeterError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let mut reader = csv::Reader::from_path(path).map_err(|e| MeterError::persistence(path, e))?;
        let mut records: Vec<MeasurementRecord> = Vec::new();
        for row in reader.deserialize() {
            records.push(row.map_err(|e| MeterError::persistence(path, e))?);
        }
        Ok(Self::from_records(records))
    }

    /// Reads ledger from CSV file, treating an unreadable file as an empty ledger.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("[ledger] ignoring previous ledger: {}", e);
                Self::new()
            }
        }
    }

    /// Writes the whole ledger to CSV file, replacing its previous content.
    ///
    /// The file is written next to `path` and renamed over it; on failure the partial file is removed
    /// and the previous content stays intact.
    pub fn persist(&self, path: &Path) -> Result<(), MeterError> {
        let tmp_path = tmp_path(path);
        let result = self
            .write_csv(&tmp_path, path)
            .and_then(|()| fs::rename(&tmp_path, path).map_err(|e| MeterError::io(path, e)));
        if let Err(e) = result {
            if tmp_path.exists() {
                if let Err(cleanup) = fs::remove_file(&tmp_path) {
                    warn!("[ledger] cannot remove {}: {}", tmp_path.display(), cleanup);
                }
            }
            return Err(e);
        }
        info!("[ledger] saved {} record(s) to {}", self.len(), path.display());
        Ok(())
    }

    fn write_csv(&self, tmp_path: &Path, path: &Path) -> Result<(), MeterError> {
        let mut writer = csv::Writer::from_path(tmp_path).map_err(|e| MeterError::persistence(path, e))?;
        for record in self.records.values() {
            writer.serialize(record).map_err(|e| MeterError::persistence(path, e))?;
        }
        writer
            .flush()
            .map_err(|e| MeterError::persistence(path, e.into()))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
