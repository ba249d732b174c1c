use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::error;

use carbonlab_meter::impact::{project_tiers, ImpactTable, Tier};
use carbonlab_meter::{Ledger, RunConfig};

fn init_logger() {
    use env_logger::{Builder, Env};
    use std::io::Write;
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Projects the per-run CO2 of baseline and optimized scenarios to annual totals
struct Args {
    /// Path to metrics ledger produced by carbonlab-run
    #[arg(short, long, default_value = "metrics_before_after.csv")]
    metrics: PathBuf,

    /// Monthly runs of the low tier
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    low: u64,

    /// Monthly runs of the medium tier
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u64).range(1..))]
    med: u64,

    /// Monthly runs of the high tier
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    high: u64,

    /// Path to YAML run configuration; its tiers replace --low/--med/--high
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let ledger = Ledger::load(&args.metrics)?;
    let (baseline, optimized) = ledger.scenario_pair()?;
    let tiers = match &args.config {
        Some(path) => RunConfig::from_file(path)?.tiers,
        None => vec![
            Tier::new("low", args.low),
            Tier::new("medium", args.med),
            Tier::new("high", args.high),
        ],
    };
    let rows = project_tiers(&tiers, baseline.co2e_kg, optimized.co2e_kg);
    println!("{}", ImpactTable(&rows));
    Ok(())
}

fn main() {
    init_logger();
    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}
