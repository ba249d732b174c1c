//! Energy and CO2 proxy model.

use dyn_clone::{clone_trait_object, DynClone};

/// Assumed power draw of the measured host in kW.
pub const DEFAULT_POWER_KW: f64 = 0.1;

const SECONDS_PER_HOUR: f64 = 3600.;
const GRAMS_PER_KG: f64 = 1000.;

/// Model for the power draw of the host running a workload.
pub trait PowerModel: DynClone {
    /// Returns the power draw in kW for a run lasting `runtime` seconds.
    fn get_power(&self, runtime: f64) -> f64;
}

clone_trait_object!(PowerModel);

/// A power model with constant power draw.
#[derive(Clone)]
pub struct ConstantPowerModel {
    power_kw: f64,
}

impl ConstantPowerModel {
    /// Creates constant power model.
    ///
    /// * `power_kw` - Power draw in kW.
    pub fn new(power_kw: f64) -> Self {
        Self { power_kw }
    }
}

impl Default for ConstantPowerModel {
    fn default() -> Self {
        Self::new(DEFAULT_POWER_KW)
    }
}

impl PowerModel for ConstantPowerModel {
    fn get_power(&self, _runtime: f64) -> f64 {
        self.power_kw
    }
}

/// Energy and emissions estimated for a single run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Footprint {
    /// Energy in kWh.
    pub energy_kwh: f64,
    /// CO2-equivalent mass in kg.
    pub co2e_kg: f64,
}

/// Converts run durations into energy and CO2 estimates using a [`PowerModel`].
#[derive(Clone)]
pub struct ProxyModel {
    power_model: Box<dyn PowerModel>,
}

impl ProxyModel {
    /// Creates proxy model with the given power model.
    pub fn new(power_model: Box<dyn PowerModel>) -> Self {
        Self { power_model }
    }

    /// Creates proxy model with constant power draw `power_kw`.
    pub fn constant(power_kw: f64) -> Self {
        Self::new(Box::new(ConstantPowerModel::new(power_kw)))
    }

    /// Estimates the footprint of a run.
    ///
    /// * `runtime` - Run duration in seconds. Negative values are clamped to zero.
    /// * `carbon_intensity` - Grid carbon intensity in gCO2/kWh. When unknown, only energy is
    ///   estimated and CO2 is reported as zero.
    pub fn estimate(&self, runtime: f64, carbon_intensity: Option<f64>) -> Footprint {
        let runtime = runtime.max(0.);
        let energy_kwh = self.power_model.get_power(runtime) * runtime / SECONDS_PER_HOUR;
        let co2e_kg = match carbon_intensity {
            Some(ci) => energy_kwh * ci / GRAMS_PER_KG,
            None => 0.,
        };
        Footprint { energy_kwh, co2e_kg }
    }
}

impl Default for ProxyModel {
    fn default() -> Self {
        Self::constant(DEFAULT_POWER_KW)
    }
}

/// Returns `(energy_kwh, co2e_kg)` for a run of `runtime` seconds at `power_kw`.
pub fn proxy(runtime: f64, carbon_intensity: Option<f64>, power_kw: f64) -> (f64, f64) {
    let footprint = ProxyModel::constant(power_kw).estimate(runtime, carbon_intensity);
    (footprint.energy_kwh, footprint.co2e_kg)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_one_hour_at_400() {
        let (energy, co2) = proxy(3600., Some(400.), DEFAULT_POWER_KW);
        assert_abs_diff_eq!(energy, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(co2, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_runtime() {
        for ci in [None, Some(0.), Some(50.), Some(1e6)] {
            assert_eq!(proxy(0., ci, DEFAULT_POWER_KW), (0., 0.));
        }
    }

    #[test]
    fn test_unknown_intensity() {
        let (energy, co2) = proxy(90., None, DEFAULT_POWER_KW);
        assert_eq!(energy, 90. * 0.1 / 3600.);
        assert_eq!(co2, 0.);
    }

    #[test]
    fn test_negative_runtime_clamped() {
        assert_eq!(proxy(-5., Some(300.), DEFAULT_POWER_KW), (0., 0.));
    }

    #[test]
    fn test_monotonic() {
        let runtimes = [0., 0.5, 1., 60., 3600., 86400.];
        let intensities = [0., 10., 250., 900.];
        for ci in intensities {
            for w in runtimes.windows(2) {
                let (e0, c0) = proxy(w[0], Some(ci), DEFAULT_POWER_KW);
                let (e1, c1) = proxy(w[1], Some(ci), DEFAULT_POWER_KW);
                assert!(e0 <= e1 && c0 <= c1);
            }
        }
        for t in runtimes {
            for w in intensities.windows(2) {
                let (_, c0) = proxy(t, Some(w[0]), DEFAULT_POWER_KW);
                let (_, c1) = proxy(t, Some(w[1]), DEFAULT_POWER_KW);
                assert!(c0 <= c1);
            }
        }
    }

    #[test]
    fn test_reproducible() {
        let model = ProxyModel::default();
        assert_eq!(model.estimate(12.345, Some(217.5)), model.estimate(12.345, Some(217.5)));
    }

    #[test]
    fn test_custom_power() {
        let model = ProxyModel::constant(0.35);
        let footprint = model.estimate(7200., Some(100.));
        assert_abs_diff_eq!(footprint.energy_kwh, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(footprint.co2e_kg, 0.07, epsilon = 1e-12);
    }
}
