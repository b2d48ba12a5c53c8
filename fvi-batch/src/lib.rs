//! Aggregation orchestrator.
//!
//! Runs a batch of up to five parcels through fetch, normalization and
//! cleaning for both indices, joins the cleaned series on date, and
//! analyzes the combined dataset once.

use chrono::Local;
use fvi_data::{clean_series, CleanedSeries, CleaningParams};
use fvi_series::{
    normalize, DateRange, IndexKind, ParcelRef, ParcelSubmission, Result, SeriesError,
    SeriesSource,
};
use fvi_stats::{analyze, CombinedRow, FarmStatsTables, PeakParams};
use log::info;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Most parcels a single batch may contain.
pub const MAX_BATCH_SIZE: usize = 5;

/// Default length of the fetch window, in years, ending today.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;

/// Everything a batch run needs besides its parcels and data source.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub range: DateRange,
    pub cleaning: CleaningParams,
    pub peaks: PeakParams,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self::with_range(DateRange::trailing_years(today, DEFAULT_LOOKBACK_YEARS))
    }
}

impl BatchConfig {
    pub fn with_range(range: DateRange) -> Self {
        Self {
            range,
            cleaning: CleaningParams::default(),
            peaks: PeakParams::default(),
        }
    }
}

/// Result of one batch: frozen parcels, the joined dataset, and the statistics tables.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub parcels: Vec<ParcelRef>,
    pub combined: Vec<CombinedRow>,
    pub tables: FarmStatsTables,
}

/// Destination for the parcels and tables of a batch.
pub trait TableSink {
    fn write_batch(&self, parcels: &[ParcelRef], tables: &FarmStatsTables) -> anyhow::Result<()>;
}

impl BatchOutput {
    /// Hand the parcels and tables to `sink`.
    pub fn persist(&self, sink: &dyn TableSink) -> anyhow::Result<()> {
        sink.write_batch(&self.parcels, &self.tables)
    }
}

/// Fetch, normalize and clean one index for one parcel.
fn cleaned_index<S: SeriesSource + ?Sized>(
    source: &S,
    parcel: &ParcelRef,
    index: IndexKind,
    config: &BatchConfig,
) -> Result<CleanedSeries> {
    let raw = source.fetch(parcel, index, &config.range)?;
    let samples = normalize(&raw)?;
    clean_series(index, &samples, &config.cleaning)
}

/// Inner join of both cleaned series on date, tagged with the parcel's identity.
pub fn join_series(parcel: &ParcelRef, ndvi: &CleanedSeries, ndmi: &CleanedSeries) -> Vec<CombinedRow> {
    ndvi.samples()
        .iter()
        .filter_map(|sample| {
            ndmi.get(&sample.date).map(|other| CombinedRow {
                parcel_id: parcel.id().to_string(),
                region: parcel.region().map(str::to_string),
                area_acres: parcel.area_acres(),
                date: sample.date,
                ndvi: sample.value,
                ndmi: other.value,
            })
        })
        .collect()
}

/// Run the full pipeline over `submissions`.
///
/// Parcels without an id get a fresh UUID v4. Two submissions sharing an id
/// are rejected as malformed. The first error from the source, normalization
/// or cleaning aborts the batch and is returned as is.
pub fn run_batch<S: SeriesSource + ?Sized>(
    submissions: Vec<ParcelSubmission>,
    source: &S,
    config: &BatchConfig,
) -> Result<BatchOutput> {
    if submissions.len() > MAX_BATCH_SIZE {
        return Err(SeriesError::BatchTooLarge {
            limit: MAX_BATCH_SIZE,
            found: submissions.len(),
        });
    }

    let mut parcels = Vec::with_capacity(submissions.len());
    let mut seen = HashSet::new();
    for submission in submissions {
        let parcel = submission.into_parcel_ref(|| Uuid::new_v4().to_string())?;
        if !seen.insert(parcel.id().to_string()) {
            return Err(SeriesError::MalformedInput(format!(
                "parcel id {} appears more than once in the batch",
                parcel.id()
            )));
        }
        parcels.push(parcel);
    }

    let mut combined = Vec::new();
    for parcel in &parcels {
        let ndvi = cleaned_index(source, parcel, IndexKind::Ndvi, config)?;
        let ndmi = cleaned_index(source, parcel, IndexKind::Ndmi, config)?;
        let rows = join_series(parcel, &ndvi, &ndmi);
        info!(
            "parcel {}: {} NDVI, {} NDMI, {} joined row(s)",
            parcel.id(),
            ndvi.len(),
            ndmi.len(),
            rows.len()
        );
        combined.extend(rows);
    }

    let tables = analyze(&combined, &config.peaks);
    for (name, count) in tables.row_counts() {
        info!("{name}: {count} row(s)");
    }
    Ok(BatchOutput {
        parcels,
        combined,
        tables,
    })
}
