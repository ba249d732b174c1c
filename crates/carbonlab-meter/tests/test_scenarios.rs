use approx::assert_abs_diff_eq;

use carbonlab_meter::impact::{project, project_tiers, Tier};
use carbonlab_meter::intensity::{median_intensity, select, CarbonSample};
use carbonlab_meter::power::{proxy, DEFAULT_POWER_KW};
use carbonlab_meter::record::{BASELINE, OPTIMIZED};
use carbonlab_meter::{Ledger, Meter, RunConfig};

#[test]
fn test_select_low_window() {
    let samples = vec![
        CarbonSample::new(Some("eu"), Some(3), 50.),
        CarbonSample::new(Some("eu"), Some(14), 300.),
    ];
    let picked = select(&samples, None);
    assert_eq!(picked.carbon_intensity, Some(50.));
    assert_eq!(picked.hour_bucket, Some(3));
}

#[test]
fn test_proxy_one_hour() {
    let (energy, co2) = proxy(3600., Some(400.), DEFAULT_POWER_KW);
    assert_abs_diff_eq!(energy, 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(co2, 0.04, epsilon = 1e-12);
}

#[test]
fn test_project_hundred_runs() {
    let impact = project(100, 10., 4.);
    assert_abs_diff_eq!(impact.before_kg / 1000., 12.);
    assert_abs_diff_eq!(impact.after_kg / 1000., 4.8);
    assert_abs_diff_eq!(impact.saved_kg / 1000., 7.2);
}

#[test]
fn test_baseline_then_optimized() {
    let samples = vec![
        CarbonSample::new(Some("eu"), Some(3), 50.),
        CarbonSample::new(Some("eu"), Some(14), 300.),
        CarbonSample::new(Some("eu"), Some(20), 450.),
    ];
    let config = RunConfig::default();
    let meter = Meter::new(config.proxy_model());
    let busy = || Ok::<_, std::convert::Infallible>((0..200_000u64).map(|x| x % 7).sum::<u64>());

    let mut ledger = Ledger::new();
    let (_, baseline) = meter
        .measure(busy, median_intensity(&samples), BASELINE, None)
        .unwrap();
    let baseline = baseline.with_error_metric(1.5);
    ledger.upsert(baseline);

    let window = select(&samples, config.region.as_deref());
    let (_, optimized) = meter
        .measure(busy, window.carbon_intensity, OPTIMIZED, Some(&window))
        .unwrap();
    let optimized = ledger.upsert(optimized).clone();

    assert_eq!(optimized.selected_hour, Some(3));
    assert_eq!(optimized.carbon_intensity, Some(50.));
    let baseline = ledger.get(BASELINE).unwrap();
    assert_eq!(baseline.carbon_intensity, Some(300.));
    assert_eq!(baseline.model_error_metric, Some(1.5));
    if baseline.co2e_kg > 0. {
        let expected = (baseline.co2e_kg - optimized.co2e_kg) / baseline.co2e_kg * 100.;
        assert_abs_diff_eq!(optimized.co2_reduction_percent.unwrap(), expected, epsilon = 1e-9);
    }

    let (b, o) = ledger.scenario_pair().unwrap();
    let rows = project_tiers(&Tier::defaults(), b.co2e_kg, o.co2e_kg);
    assert_eq!(rows.len(), 3);
    for row in rows {
        assert_abs_diff_eq!(row.tons_saved, row.tons_before - row.tons_after, epsilon = 1e-12);
    }
}
