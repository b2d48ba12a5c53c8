//! Turns raw source samples into a date-ascending, duplicate-free series.

use crate::error::{Result, SeriesError};
use crate::sample::{RawDate, RawSample, Sample};
use chrono::NaiveDate;
use fvi_utils::dates::{date_from_epoch_millis, parse_flexible};
use std::collections::HashSet;

/// Resolve a raw date to a calendar date.
pub fn resolve_date(raw: &RawDate) -> Result<NaiveDate> {
    match raw {
        RawDate::Date(date) => Ok(*date),
        RawDate::Text(text) => {
            parse_flexible(text).map_err(|e| SeriesError::MalformedInput(e.to_string()))
        }
        RawDate::EpochMillis(millis) => {
            date_from_epoch_millis(*millis).map_err(|e| SeriesError::MalformedInput(e.to_string()))
        }
    }
}

/// Normalize one parcel/index series.
///
/// Dates are resolved and sorted ascending. When a date repeats, the sample
/// that came first in the input is kept. Non-finite values become missing.
pub fn normalize(raw: &[RawSample]) -> Result<Vec<Sample>> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut samples = Vec::with_capacity(raw.len());
    for sample in raw {
        let date = resolve_date(&sample.date)?;
        if !seen.insert(date) {
            continue;
        }
        samples.push(Sample {
            date,
            value: sample.value.filter(|v| v.is_finite()),
        });
    }
    // stable, so input order survives among equal keys
    samples.sort_by_key(|s| s.date);
    let dropped = raw.len() - samples.len();
    if dropped > 0 {
        log::debug!("dropped {dropped} duplicate-date sample(s)");
    }
    Ok(samples)
}
