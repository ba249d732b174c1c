//! Measurement of a single workload run.

use std::time::Instant;

use log::debug;

use crate::intensity::SelectionResult;
use crate::power::ProxyModel;
use crate::record::MeasurementRecord;

/// Returns a description of the current platform: OS, architecture and logical CPU count.
pub fn hardware_descriptor() -> String {
    let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
    format!("{}-{}-{}cpu", std::env::consts::OS, std::env::consts::ARCH, cpus)
}

/// Runs workloads and turns their runtime into [`MeasurementRecord`]s.
///
/// The meter never touches the ledger, committing the record is up to the caller.
#[derive(Clone, Default)]
pub struct Meter {
    model: ProxyModel,
}

impl Meter {
    /// Creates meter using the given proxy model.
    pub fn new(model: ProxyModel) -> Self {
        Self { model }
    }

    /// Runs `work` exactly once and measures it.
    ///
    /// * `carbon_intensity` - Grid carbon intensity for the run in gCO2/kWh, if known.
    /// * `scenario` - Scenario name of the produced record.
    /// * `selection` - Execution window the run was scheduled into, if any.
    ///
    /// An error returned by `work` is passed through unchanged and no record is produced.
    pub fn measure<T, E, F>(
        &self,
        work: F,
        carbon_intensity: Option<f64>,
        scenario: &str,
        selection: Option<&SelectionResult>,
    ) -> Result<(T, MeasurementRecord), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let start = Instant::now();
        let output = work()?;
        let runtime = start.elapsed().as_secs_f64();

        let footprint = self.model.estimate(runtime, carbon_intensity);
        debug!(
            "[meter] {}: runtime={:.3}s energy={:.6}kWh co2e={:.6}kg",
            scenario, runtime, footprint.energy_kwh, footprint.co2e_kg
        );
        let record = MeasurementRecord {
            scenario: scenario.to_string(),
            runtime_seconds: runtime,
            energy_kwh: footprint.energy_kwh,
            co2e_kg: footprint.co2e_kg,
            carbon_intensity,
            hardware_descriptor: hardware_descriptor(),
            model_error_metric: None,
            selected_region: selection.and_then(|s| s.region.clone()),
            selected_hour: selection.and_then(|s| s.hour_bucket),
            co2_reduction_percent: None,
        };
        Ok((output, record))
    }
}
