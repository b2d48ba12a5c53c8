use chrono::NaiveDate;
use fvi_series::error::{Result, RowViolation, SeriesError, ViolationReason};
use fvi_series::{IndexKind, Sample};
use serde::Serialize;

/// Inclusive bounds every present index value must respect.
pub const VALUE_MIN: f64 = -1.0;
pub const VALUE_MAX: f64 = 1.0;

/// An analysis-ready series for one parcel and index.
///
/// Dates are strictly increasing and present values are finite and inside
/// [-1, 1]. Only `validate` builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedSeries {
    index: IndexKind,
    samples: Vec<Sample>,
}

impl CleanedSeries {
    pub fn index(&self) -> IndexKind {
        self.index
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&Sample> {
        self.samples
            .binary_search_by_key(date, |s| s.date)
            .ok()
            .map(|i| &self.samples[i])
    }
}

/// Check the structural contract and wrap the samples, or report every offending row.
pub fn validate(index: IndexKind, samples: Vec<Sample>) -> Result<CleanedSeries> {
    let mut violations = Vec::new();
    let mut previous: Option<NaiveDate> = None;
    for (row, sample) in samples.iter().enumerate() {
        if previous.is_some_and(|p| sample.date <= p) {
            violations.push(RowViolation {
                row,
                date: sample.date,
                value: sample.value,
                reason: ViolationReason::DateNotIncreasing,
            });
        }
        previous = Some(sample.date);
        let reason = match sample.value {
            Some(v) if !v.is_finite() => Some(ViolationReason::NotFinite),
            Some(v) if !(VALUE_MIN..=VALUE_MAX).contains(&v) => Some(ViolationReason::OutOfRange),
            _ => None,
        };
        if let Some(reason) = reason {
            violations.push(RowViolation {
                row,
                date: sample.date,
                value: sample.value,
                reason,
            });
        }
    }
    if violations.is_empty() {
        Ok(CleanedSeries { index, samples })
    } else {
        for violation in &violations {
            log::debug!("{index} validation: {violation}");
        }
        Err(SeriesError::SchemaViolation { index, violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn accepts_valid_series() {
        let samples = vec![Sample::new(d(1), Some(-1.0)), Sample::new(d(2), None), Sample::new(d(3), Some(1.0))];
        let series = validate(IndexKind::Ndvi, samples).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(&d(3)).and_then(|s| s.value), Some(1.0));
        assert!(series.get(&d(4)).is_none());
    }

    #[test]
    fn reports_every_offending_row() {
        let samples = vec![
            Sample::new(d(1), Some(0.2)),
            Sample::new(d(1), Some(1.4)),
            Sample::new(d(3), Some(f64::NAN)),
        ];
        match validate(IndexKind::Ndmi, samples) {
            Err(SeriesError::SchemaViolation { index, violations }) => {
                assert_eq!(index, IndexKind::Ndmi);
                let reasons: Vec<_> = violations.iter().map(|v| (v.row, v.reason)).collect();
                assert_eq!(
                    reasons,
                    vec![
                        (1, ViolationReason::DateNotIncreasing),
                        (1, ViolationReason::OutOfRange),
                        (2, ViolationReason::NotFinite),
                    ]
                );
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn empty_series_is_valid() {
        assert!(validate(IndexKind::Ndvi, Vec::new()).unwrap().is_empty());
    }
}
