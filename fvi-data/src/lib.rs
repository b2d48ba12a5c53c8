//! Cleaning pipeline for vegetation index series.
//!
//! Turns a normalized series into an analysis-ready `CleanedSeries`: gaps are
//! filled, isolation-forest outliers are replaced, the signal is smoothed and
//! clipped, and the result is structurally validated.

pub mod outliers;
pub mod smoothing;
pub mod validation;

pub use outliers::{detect_outliers, IsolationForestParams};
pub use smoothing::smooth;
pub use validation::{validate, CleanedSeries};

use fvi_series::{IndexKind, Result, Sample};
use log::{info, warn};

/// Filling of missing values by sample position.
pub mod interpolation {
    /// Linearly interpolate interior gaps between the nearest present neighbours.
    ///
    /// Interpolation is by position in the series, not by date. Leading gaps
    /// are then backward-filled and trailing gaps forward-filled. A series
    /// with no present value is returned unchanged.
    pub fn fill_gaps(values: &[Option<f64>]) -> Vec<Option<f64>> {
        let present: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
        let (Some(&first), Some(&last)) = (present.first(), present.last()) else {
            return values.to_vec();
        };

        let mut filled = values.to_vec();
        for pair in present.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if let (Some(a), Some(b)) = (values[start], values[end]) {
                let slope = (b - a) / (end - start) as f64;
                for i in start + 1..end {
                    filled[i] = Some(a + slope * (i - start) as f64);
                }
            }
        }
        let head = values[first];
        let tail = values[last];
        for value in filled[..first].iter_mut() {
            *value = head;
        }
        for value in filled[last + 1..].iter_mut() {
            *value = tail;
        }
        filled
    }

    /// Replace each missing value with the next present one.
    pub fn backward_fill(values: &mut [Option<f64>]) {
        let mut next = None;
        for value in values.iter_mut().rev() {
            match value {
                Some(v) => next = Some(*v),
                None => *value = next,
            }
        }
    }

    /// Replace each missing value with the previous present one.
    pub fn forward_fill(values: &mut [Option<f64>]) {
        let mut previous = None;
        for value in values.iter_mut() {
            match value {
                Some(v) => previous = Some(*v),
                None => *value = previous,
            }
        }
    }

}

/// Fixed constants of the cleaning pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningParams {
    pub outliers: IsolationForestParams,
    /// Savitzky–Golay window length (odd)
    pub window: usize,
    /// Savitzky–Golay polynomial degree
    pub degree: usize,
    pub clip_min: f64,
    pub clip_max: f64,
}

impl Default for CleaningParams {
    fn default() -> Self {
        Self {
            outliers: IsolationForestParams::default(),
            window: 7,
            degree: 3,
            clip_min: validation::VALUE_MIN,
            clip_max: validation::VALUE_MAX,
        }
    }
}

/// Run the full cleaning pipeline on one normalized series.
///
/// Only the final structural validation can fail.
pub fn clean_series(index: IndexKind, samples: &[Sample], params: &CleaningParams) -> Result<CleanedSeries> {
    let raw: Vec<Option<f64>> = samples.iter().map(|s| s.value).collect();
    let mut values = interpolation::fill_gaps(&raw);

    if let Some(complete) = values.iter().copied().collect::<Option<Vec<f64>>>() {
        let flags = detect_outliers(&complete, &params.outliers);
        for (value, flagged) in values.iter_mut().zip(&flags) {
            if *flagged {
                *value = None;
            }
        }
        interpolation::backward_fill(&mut values);
        interpolation::forward_fill(&mut values);
    }

    match values.iter().copied().collect::<Option<Vec<f64>>>() {
        Some(complete) if complete.len() >= params.window => {
            values = smooth(&complete, params.window, params.degree)
                .into_iter()
                .map(Some)
                .collect();
        }
        Some(complete) => warn!(
            "{index}: skipping smoothing, {} sample(s) is shorter than window {}",
            complete.len(),
            params.window
        ),
        None => warn!("{index}: skipping smoothing, series still has missing values"),
    }

    let cleaned: Vec<Sample> = samples
        .iter()
        .zip(values)
        .map(|(s, v)| Sample::new(s.date, v.map(|v| v.clamp(params.clip_min, params.clip_max))))
        .collect();
    let series = validate(index, cleaned)?;
    info!("{index}: cleaned {} sample(s)", series.len());
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(values: &[Option<f64>]) -> Vec<Sample> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(start + Days::new(5 * i as u64), *v))
            .collect()
    }

    #[test]
    fn removes_extreme_outlier() {
        let mut values: Vec<Option<f64>> = (0..40).map(|i| Some(0.19 + 0.01 * (i % 3) as f64)).collect();
        values[20] = Some(0.95);
        let cleaned = clean_series(IndexKind::Ndvi, &series(&values), &CleaningParams::default()).unwrap();
        let max = cleaned
            .samples()
            .iter()
            .filter_map(|s| s.value)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(max < 0.3);
    }

    #[test]
    fn outputs_stay_in_range() {
        let values: Vec<Option<f64>> = (0..30)
            .map(|i| if i % 7 == 3 { None } else { Some(if i % 2 == 0 { 1.0 } else { -1.0 }) })
            .collect();
        let cleaned = clean_series(IndexKind::Ndmi, &series(&values), &CleaningParams::default()).unwrap();
        assert_eq!(cleaned.len(), 30);
        for sample in cleaned.samples() {
            let v = sample.value.unwrap();
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn cleaning_is_idempotent_on_stable_series() {
        let params = CleaningParams::default();
        let once = clean_series(IndexKind::Ndvi, &series(&[Some(0.42); 24]), &params).unwrap();
        let twice = clean_series(IndexKind::Ndvi, once.samples(), &params).unwrap();
        for (a, b) in once.samples().iter().zip(twice.samples()) {
            assert_eq!(a.date, b.date);
            assert!((a.value.unwrap() - b.value.unwrap()).abs() < 1e-9);
        }
    }

    fn extremes(series: &CleanedSeries) -> (f64, f64) {
        series
            .samples()
            .iter()
            .filter_map(|s| s.value)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }

    #[test]
    fn recleaning_seasonal_series_keeps_extremes() {
        // A second pass may still move individual samples slightly.
        let values: Vec<Option<f64>> = (0..73)
            .map(|i| Some(0.45 + 0.3 * (std::f64::consts::TAU * i as f64 / 73.0).sin()))
            .collect();
        let params = CleaningParams::default();
        let once = clean_series(IndexKind::Ndvi, &series(&values), &params).unwrap();
        let twice = clean_series(IndexKind::Ndvi, once.samples(), &params).unwrap();

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.samples().iter().zip(twice.samples()) {
            assert_eq!(a.date, b.date);
            let v = b.value.unwrap();
            assert!((-1.0..=1.0).contains(&v));
        }
        let (min_once, max_once) = extremes(&once);
        let (min_twice, max_twice) = extremes(&twice);
        assert!((min_once - min_twice).abs() < 0.01, "min {min_once} -> {min_twice}");
        assert!((max_once - max_twice).abs() < 0.01, "max {max_once} -> {max_twice}");
    }

    #[test]
    fn short_series_skips_smoothing() {
        let cleaned = clean_series(
            IndexKind::Ndvi,
            &series(&[Some(0.3), None, Some(0.3)]),
            &CleaningParams::default(),
        )
        .unwrap();
        let values: Vec<f64> = cleaned.samples().iter().filter_map(|s| s.value).collect();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| (v - 0.3).abs() < 1e-12));
    }

    #[test]
    fn all_missing_series_stays_missing() {
        let cleaned = clean_series(IndexKind::Ndmi, &series(&[None; 10]), &CleaningParams::default()).unwrap();
        assert!(cleaned.samples().iter().all(|s| s.value.is_none()));
    }

    #[test]
    fn duplicate_dates_fail_validation() {
        let mut samples = series(&[Some(0.2), Some(0.3)]);
        samples[1].date = samples[0].date;
        let result = clean_series(IndexKind::Ndvi, &samples, &CleaningParams::default());
        assert!(matches!(result, Err(fvi_series::SeriesError::SchemaViolation { .. })));
    }
}
