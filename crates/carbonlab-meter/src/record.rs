//! Measurement records stored in the metrics ledger.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Scenario name of the reference run.
pub const BASELINE: &str = "Baseline";
/// Scenario name of the carbon-aware run.
pub const OPTIMIZED: &str = "Optimized";

/// Runtime, energy and emissions of one run of a scenario.
///
/// Field names follow the column names of the ledger file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Scenario name, unique within a ledger.
    #[serde(rename = "Scenario")]
    pub scenario: String,
    /// Elapsed wall time of the workload in seconds.
    #[serde(rename = "Runtime_s")]
    pub runtime_seconds: f64,
    /// Estimated energy in kWh.
    #[serde(rename = "Energy_kWh")]
    pub energy_kwh: f64,
    /// Estimated CO2-equivalent mass in kg.
    #[serde(rename = "CO2e_kg")]
    pub co2e_kg: f64,
    /// Carbon intensity used for the estimate in gCO2/kWh.
    #[serde(rename = "carbon_intensity_gco2_per_kwh")]
    pub carbon_intensity: Option<f64>,
    /// Free-form description of the host platform.
    #[serde(rename = "hardware")]
    pub hardware_descriptor: String,
    /// Error metric reported by the workload (MAE for the reference workload).
    #[serde(rename = "MAE")]
    pub model_error_metric: Option<f64>,
    /// Region of the selected execution window.
    #[serde(rename = "picked_region")]
    pub selected_region: Option<String>,
    /// Hour bucket of the selected execution window.
    #[serde(rename = "picked_utc_hr", deserialize_with = "deserialize_hour")]
    pub selected_hour: Option<u32>,
    /// CO2 reduction against the baseline in percent, set when the record enters the ledger.
    #[serde(rename = "CO2_Reduction_%")]
    pub co2_reduction_percent: Option<f64>,
}

/// Reads an hour bucket written either as an integer or as an integral float (`3.0`).
fn deserialize_hour<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(hour) if hour.is_nan() => Ok(None),
        Some(hour) if hour.fract() == 0. && (0. ..24.).contains(&hour) => Ok(Some(hour as u32)),
        Some(hour) => Err(de::Error::custom(format!("invalid hour bucket {}", hour))),
    }
}

impl MeasurementRecord {
    /// Attaches the workload error metric.
    pub fn with_error_metric(mut self, value: f64) -> Self {
        self.model_error_metric = Some(value);
        self
    }

    /// Returns true if this is a record of the baseline scenario.
    pub fn is_baseline(&self) -> bool {
        self.scenario.eq_ignore_ascii_case(BASELINE)
    }

    /// Returns true if this is a record of the optimized scenario.
    pub fn is_optimized(&self) -> bool {
        self.scenario.eq_ignore_ascii_case(OPTIMIZED)
    }
}
