//! Selection of low carbon-intensity execution windows.

use serde::{Deserialize, Serialize};

/// A single carbon-intensity observation of the grid.
///
/// `region` and `hour_bucket` are `None` when the source table has no such column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarbonSample {
    /// Grid region name.
    pub region: Option<String>,
    /// Hour of day (0-23, UTC).
    pub hour_bucket: Option<u32>,
    /// Carbon intensity in gCO2/kWh.
    pub carbon_intensity: f64,
}

impl CarbonSample {
    /// Creates a sample.
    pub fn new(region: Option<&str>, hour_bucket: Option<u32>, carbon_intensity: f64) -> Self {
        Self {
            region: region.map(str::to_string),
            hour_bucket,
            carbon_intensity,
        }
    }
}

/// The execution window picked by [`select`].
///
/// All fields are `None` when no eligible sample exists. Zero is a valid intensity and never
/// stands for missing data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Region of the picked sample.
    pub region: Option<String>,
    /// Hour bucket of the picked sample.
    pub hour_bucket: Option<u32>,
    /// Carbon intensity of the picked sample in gCO2/kWh.
    pub carbon_intensity: Option<f64>,
}

impl SelectionResult {
    /// Returns the "no better window found" result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if no sample was eligible for selection.
    pub fn is_empty(&self) -> bool {
        self.carbon_intensity.is_none()
    }
}

impl From<&CarbonSample> for SelectionResult {
    fn from(sample: &CarbonSample) -> Self {
        Self {
            region: sample.region.clone(),
            hour_bucket: sample.hour_bucket,
            carbon_intensity: Some(sample.carbon_intensity),
        }
    }
}

/// Picks the sample with the lowest carbon intensity.
///
/// If `region` is given and the samples carry a region attribute, only samples of this region are
/// considered. Ties are resolved in favour of the earliest sample, so the result is deterministic
/// for identical input. An empty candidate set yields [`SelectionResult::empty`].
pub fn select(samples: &[CarbonSample], region: Option<&str>) -> SelectionResult {
    let has_region = samples.iter().any(|s| s.region.is_some());
    let best = samples
        .iter()
        .filter(|s| match region {
            Some(name) if has_region => s.region.as_deref() == Some(name),
            _ => true,
        })
        .fold(None, |best: Option<&CarbonSample>, s| match best {
            Some(b) if b.carbon_intensity <= s.carbon_intensity => Some(b),
            _ => Some(s),
        });
    match best {
        Some(sample) => SelectionResult::from(sample),
        None => SelectionResult::empty(),
    }
}

/// Returns the median carbon intensity of the samples, or `None` for an empty set.
///
/// For an even number of samples the mean of the two middle values is returned.
pub fn median_intensity(samples: &[CarbonSample]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = samples.iter().map(|s| s.carbon_intensity).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eu_day() -> Vec<CarbonSample> {
        vec![
            CarbonSample::new(Some("eu"), Some(3), 50.),
            CarbonSample::new(Some("eu"), Some(14), 300.),
        ]
    }

    #[test]
    fn test_picks_minimum() {
        let picked = select(&eu_day(), None);
        assert_eq!(picked.carbon_intensity, Some(50.));
        assert_eq!(picked.hour_bucket, Some(3));
        assert_eq!(picked.region.as_deref(), Some("eu"));
    }

    #[test]
    fn test_empty_set() {
        let picked = select(&[], None);
        assert!(picked.is_empty());
        assert_eq!(picked, SelectionResult::empty());
        assert!(select(&[], Some("eu")).is_empty());
    }

    #[test]
    fn test_region_filter() {
        let mut samples = eu_day();
        samples.push(CarbonSample::new(Some("us"), Some(1), 20.));
        samples.push(CarbonSample::new(Some("us"), Some(2), 400.));

        assert_eq!(select(&samples, None).region.as_deref(), Some("us"));
        let eu = select(&samples, Some("eu"));
        assert_eq!(eu.region.as_deref(), Some("eu"));
        assert_eq!(eu.carbon_intensity, Some(50.));
        assert!(select(&samples, Some("asia")).is_empty());
    }

    #[test]
    fn test_region_filter_ignored_without_region_column() {
        let samples = vec![CarbonSample::new(None, Some(5), 120.), CarbonSample::new(None, Some(6), 80.)];
        let picked = select(&samples, Some("eu"));
        assert_eq!(picked.carbon_intensity, Some(80.));
        assert_eq!(picked.region, None);
        assert_eq!(picked.hour_bucket, Some(6));
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let samples = vec![
            CarbonSample::new(Some("a"), Some(1), 100.),
            CarbonSample::new(Some("b"), Some(2), 10.),
            CarbonSample::new(Some("c"), Some(3), 10.),
            CarbonSample::new(Some("d"), Some(4), 10.),
        ];
        for _ in 0..3 {
            let picked = select(&samples, None);
            assert_eq!(picked.region.as_deref(), Some("b"));
            assert_eq!(picked.hour_bucket, Some(2));
        }
    }

    #[test]
    fn test_zero_intensity_is_data() {
        let samples = vec![CarbonSample::new(Some("hydro"), None, 0.)];
        let picked = select(&samples, None);
        assert!(!picked.is_empty());
        assert_eq!(picked.carbon_intensity, Some(0.));
        assert_eq!(picked.hour_bucket, None);
    }

    #[test]
    fn test_median() {
        assert_eq!(median_intensity(&[]), None);
        assert_eq!(median_intensity(&eu_day()), Some(175.));
        let odd = vec![
            CarbonSample::new(None, None, 30.),
            CarbonSample::new(None, None, 10.),
            CarbonSample::new(None, None, 20.),
        ];
        assert_eq!(median_intensity(&odd), Some(20.));
    }
}
