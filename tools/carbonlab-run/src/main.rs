use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::error;

use carbonlab_meter::RunConfig;
use carbonlab_pipeline::{run_mode, Mode};

fn init_logger() {
    use env_logger::{Builder, Env};
    use std::io::Write;
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs the workload as baseline or optimized scenario and records its energy and CO2 footprint
struct Args {
    /// Scenario to run: baseline or optimized
    #[arg(short, long, env = "MODE", default_value = "optimized")]
    mode: Mode,

    /// Directory with train.csv, test.csv and metaData.csv
    #[arg(short, long = "data", env = "DATA_PATH")]
    data_path: Option<PathBuf>,

    /// Directory for the metrics ledger and submission files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Restrict carbon-intensity window selection to this region
    #[arg(short, long)]
    region: Option<String>,

    /// Assumed power draw of the host in kW
    #[arg(long)]
    power_kw: Option<f64>,

    /// Path to YAML file with run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(data_path) = args.data_path {
        config.data_dir = data_path;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if args.region.is_some() {
        config.region = args.region;
    }
    if let Some(power_kw) = args.power_kw {
        config.assumed_power_kw = power_kw;
    }

    let summary = run_mode(args.mode, &config)?;
    println!(
        "[{}] Saved submission -> {}",
        summary.record.scenario,
        summary.submission_path.display()
    );
    println!(
        "[{}] Saved metrics -> {}",
        summary.record.scenario,
        summary.ledger_path.display()
    );
    Ok(())
}

fn main() {
    init_logger();
    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        let args = Args::parse_from([
            "carbonlab-run",
            "--mode",
            "baseline",
            "--data",
            data.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ]);

        let err = run(args).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("train.csv"), "{}", message);
        assert!(message.contains("metaData.csv"), "{}", message);
        assert!(!out.join("metrics_before_after.csv").exists());
    }
}
