use crate::date_range::DateRange;
use crate::error::{Result, SeriesError};
use crate::index::IndexKind;
use crate::normalizer::resolve_date;
use crate::parcel::ParcelRef;
use crate::sample::{parse_long_form_csv, ParcelSample, RawSample};
use std::collections::HashMap;

/// Satellite data source seam: one raw series per parcel and index.
///
/// Implementations report their own failures as `SeriesError::UpstreamFetch`.
pub trait SeriesSource {
    fn fetch(
        &self,
        parcel: &ParcelRef,
        index: IndexKind,
        range: &DateRange,
    ) -> Result<Vec<RawSample>>;
}

impl<F> SeriesSource for F
where
    F: Fn(&ParcelRef, IndexKind, &DateRange) -> Result<Vec<RawSample>>,
{
    fn fetch(
        &self,
        parcel: &ParcelRef,
        index: IndexKind,
        range: &DateRange,
    ) -> Result<Vec<RawSample>> {
        self(parcel, index, range)
    }
}

/// Pre-fetched samples keyed by parcel id and index.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<(String, IndexKind), Vec<RawSample>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append samples to the series of one parcel and index.
    pub fn insert(&mut self, parcel_id: &str, index: IndexKind, samples: Vec<RawSample>) {
        self.series
            .entry((parcel_id.to_string(), index))
            .or_default()
            .extend(samples);
    }

    pub fn from_samples(samples: Vec<ParcelSample>) -> Self {
        let mut source = Self::new();
        for row in samples {
            source.insert(&row.parcel_id, row.index, vec![row.sample]);
        }
        source
    }

    /// Load from a long-form CSV (`uuid, index, date, value`).
    pub fn from_csv(csv_object: &str) -> Result<Self> {
        Ok(Self::from_samples(parse_long_form_csv(csv_object)?))
    }
}

impl SeriesSource for InMemorySource {
    /// Samples inside `range`. Dates that cannot be resolved are passed through
    /// so that normalization reports them.
    fn fetch(
        &self,
        parcel: &ParcelRef,
        index: IndexKind,
        range: &DateRange,
    ) -> Result<Vec<RawSample>> {
        let samples = self
            .series
            .get(&(parcel.id().to_string(), index))
            .ok_or_else(|| SeriesError::UpstreamFetch {
                parcel_id: parcel.id().to_string(),
                index,
                message: "no samples available".to_string(),
            })?;
        Ok(samples
            .iter()
            .filter(|s| match resolve_date(&s.date) {
                Ok(date) => range.contains(&date),
                Err(_) => true,
            })
            .cloned()
            .collect())
    }
}
