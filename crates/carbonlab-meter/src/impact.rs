//! Projection of per-run emissions to annual totals.

use std::fmt;

use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: f64 = 12.;
const KG_PER_TONNE: f64 = 1000.;

/// Annual emissions before and after adopting the optimized scenario, in kg.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnualImpact {
    /// Emissions of the baseline scenario.
    pub before_kg: f64,
    /// Emissions of the optimized scenario.
    pub after_kg: f64,
    /// Difference between the two.
    pub saved_kg: f64,
}

/// Projects per-run emissions to a year of `monthly_runs` runs per month.
///
/// Savings are not validated: a regression shows up as negative savings.
pub fn project(monthly_runs: u64, co2e_before_kg: f64, co2e_after_kg: f64) -> AnnualImpact {
    // in f64: any u64 run count is valid and must not overflow
    let runs_per_year = monthly_runs as f64 * MONTHS_PER_YEAR;
    let before_kg = runs_per_year * co2e_before_kg;
    let after_kg = runs_per_year * co2e_after_kg;
    AnnualImpact {
        before_kg,
        after_kg,
        saved_kg: before_kg - after_kg,
    }
}

/// Named assumption about monthly run volume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Tier name.
    pub name: String,
    /// Runs per month.
    pub monthly_runs: u64,
}

impl Tier {
    /// Creates tier.
    pub fn new(name: &str, monthly_runs: u64) -> Self {
        Self {
            name: name.to_string(),
            monthly_runs,
        }
    }

    /// The low/medium/high tiers used when none are configured.
    pub fn defaults() -> Vec<Tier> {
        vec![Tier::new("low", 50), Tier::new("medium", 200), Tier::new("high", 500)]
    }
}

/// Annual impact of one tier, in tonnes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct ImpactRow {
    pub tier_name: String,
    pub monthly_runs: u64,
    pub tons_before: f64,
    pub tons_after: f64,
    pub tons_saved: f64,
}

/// Evaluates every tier over the same per-run before/after pair.
pub fn project_tiers(tiers: &[Tier], co2e_before_kg: f64, co2e_after_kg: f64) -> Vec<ImpactRow> {
    tiers
        .iter()
        .map(|tier| {
            let impact = project(tier.monthly_runs, co2e_before_kg, co2e_after_kg);
            ImpactRow {
                tier_name: tier.name.clone(),
                monthly_runs: tier.monthly_runs,
                tons_before: impact.before_kg / KG_PER_TONNE,
                tons_after: impact.after_kg / KG_PER_TONNE,
                tons_saved: impact.saved_kg / KG_PER_TONNE,
            }
        })
        .collect()
}

/// Text table over impact rows.
pub struct ImpactTable<'a>(pub &'a [ImpactRow]);

const HEADERS: [&str; 5] = [
    "scenario",
    "tasks_per_month",
    "tCO2_year_before",
    "tCO2_year_after",
    "tCO2_year_saved",
];

impl fmt::Display for ImpactTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 5]> = self
            .0
            .iter()
            .map(|row| {
                [
                    row.tier_name.clone(),
                    row.monthly_runs.to_string(),
                    format!("{:.6}", row.tons_before),
                    format!("{:.6}", row.tons_after),
                    format!("{:.6}", row.tons_saved),
                ]
            })
            .collect();
        let mut widths = HEADERS.map(str::len);
        for row in cells.iter() {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }
        for (i, header) in HEADERS.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:>width$}", header, width = widths[i])?;
        }
        for row in cells.iter() {
            writeln!(f)?;
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:>width$}", cell, width = widths[i])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    #[test]
    fn test_project() {
        let impact = project(100, 10., 4.);
        assert_eq!(impact.before_kg, 12000.);
        assert_eq!(impact.after_kg, 4800.);
        assert_eq!(impact.saved_kg, 7200.);
    }

    #[test]
    fn test_saved_is_difference() {
        for (m, b, a) in [(1, 0.3, 0.1), (50, 0.0123, 0.0456), (777, 1e-7, 3e-9)] {
            let impact = project(m, b, a);
            assert_eq!(impact.saved_kg, impact.before_kg - impact.after_kg);
        }
        for (m, b) in [(1, 0.3), (500, 0.0123), (12345, 1e-7)] {
            assert_eq!(project(m, b, b).saved_kg, 0.);
        }
    }

    #[test]
    fn test_regression_is_negative_saving() {
        let impact = project(10, 1., 2.);
        assert_eq!(impact.saved_kg, -120.);
    }

    #[test]
    fn test_huge_run_count() {
        let impact = project(u64::MAX / 6, 1., 0.5);
        assert!(impact.before_kg.is_finite());
        assert_relative_eq!(impact.before_kg, (u64::MAX / 6) as f64 * 12., max_relative = 1e-12);
        assert_relative_eq!(impact.after_kg, impact.before_kg / 2., max_relative = 1e-12);
        assert_eq!(impact.saved_kg, impact.before_kg - impact.after_kg);

        let rows = project_tiers(&[Tier::new("max", u64::MAX)], 1e-3, 0.);
        assert!(rows[0].tons_saved > 0.);
    }

    #[test]
    fn test_tiers() {
        let rows = project_tiers(&Tier::defaults(), 10., 4.);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].tier_name, "low");
        assert_eq!(rows[0].monthly_runs, 50);
        assert_abs_diff_eq!(rows[0].tons_before, 6.);
        assert_abs_diff_eq!(rows[0].tons_after, 2.4);
        assert_abs_diff_eq!(rows[0].tons_saved, 3.6);
        assert_abs_diff_eq!(rows[2].tons_saved, 36.);
    }

    #[test]
    fn test_table() {
        let rows = project_tiers(&[Tier::new("medium", 100)], 10., 4.);
        let text = ImpactTable(&rows).to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("scenario tasks_per_month"));
        assert_eq!(
            lines[1].split_whitespace().collect::<Vec<_>>(),
            vec!["medium", "100", "12.000000", "4.800000", "7.200000"]
        );
    }
}
