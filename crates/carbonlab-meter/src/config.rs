//! Run configuration.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MeterError;
use crate::impact::Tier;
use crate::ledger::LEDGER_FILE_NAME;
use crate::power::{ProxyModel, DEFAULT_POWER_KW};

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_power_kw() -> f64 {
    DEFAULT_POWER_KW
}

fn default_seed() -> u64 {
    42
}

/// Configuration of a single invocation.
///
/// Can be loaded from YAML, missing fields take their defaults, and then adjusted field by field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory with `train.csv`, `test.csv` and `metaData.csv`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory receiving the ledger and submission files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Assumed power draw of the host in kW.
    #[serde(default = "default_power_kw")]
    pub assumed_power_kw: f64,
    /// Restricts window selection to this region.
    #[serde(default)]
    pub region: Option<String>,
    /// Run-volume tiers for impact projection.
    #[serde(default = "Tier::defaults")]
    pub tiers: Vec<Tier>,
    /// Seed of the workload random generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            assumed_power_kw: default_power_kw(),
            region: None,
            tiers: Tier::defaults(),
            seed: default_seed(),
        }
    }
}

impl RunConfig {
    /// Reads config from YAML file.
    pub fn from_file(path: &Path) -> Result<Self, MeterError> {
        let file = File::open(path).map_err(|e| MeterError::io(path, e))?;
        let config: RunConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), MeterError> {
        if !(self.assumed_power_kw.is_finite() && self.assumed_power_kw > 0.) {
            return Err(MeterError::Config(format!(
                "assumed power must be positive, got {}",
                self.assumed_power_kw
            )));
        }
        if let Some(tier) = self.tiers.iter().find(|t| t.monthly_runs == 0) {
            return Err(MeterError::Config(format!("tier {} has zero monthly runs", tier.name)));
        }
        Ok(())
    }

    /// Proxy model with the configured power draw.
    pub fn proxy_model(&self) -> ProxyModel {
        ProxyModel::constant(self.assumed_power_kw)
    }

    /// Path of the metrics ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.output_dir.join(LEDGER_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let config: RunConfig = serde_yaml::from_str("output_dir: out\nregion: eu\n").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.region.as_deref(), Some("eu"));
        assert_eq!(config.assumed_power_kw, DEFAULT_POWER_KW);
        assert_eq!(config.tiers, Tier::defaults());
        assert_eq!(config.ledger_path(), PathBuf::from("out").join("metrics_before_after.csv"));
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_tiers() {
        let yaml = "tiers:\n  - name: pilot\n    monthly_runs: 10\nassumed_power_kw: 0.25\n";
        let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tiers, vec![Tier::new("pilot", 10)]);
        assert_eq!(config.assumed_power_kw, 0.25);
    }

    #[test]
    fn test_validate() {
        let mut config = RunConfig {
            assumed_power_kw: 0.,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MeterError::Config(_))));
        config.assumed_power_kw = 0.1;
        config.tiers.push(Tier::new("empty", 0));
        assert!(matches!(config.validate(), Err(MeterError::Config(_))));
    }
}
