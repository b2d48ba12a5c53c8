use crate::error::{Result, SeriesError};
use crate::index::IndexKind;
use crate::parcel::{cell, find_column};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

const DATE_HEADERS: [&str; 2] = ["date", "time"];
const PARCEL_HEADERS: [&str; 2] = ["uuid", "parcel_id"];
const INDEX_HEADERS: [&str; 2] = ["index", "index_name"];
const VALUE_HEADERS: [&str; 1] = ["value"];

/// Cell spellings treated as a missing value.
const NULL_MARKERS: [&str; 4] = ["null", "none", "na", "---"];

/// Date exactly as a data source reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawDate {
    Date(NaiveDate),
    Text(String),
    /// Milliseconds since the Unix epoch, UTC
    EpochMillis(i64),
}

impl From<NaiveDate> for RawDate {
    fn from(date: NaiveDate) -> Self {
        RawDate::Date(date)
    }
}

impl From<&str> for RawDate {
    fn from(text: &str) -> Self {
        RawDate::Text(text.to_string())
    }
}

impl RawDate {
    /// Classify a text cell: long integers are epoch milliseconds.
    fn from_cell(text: &str) -> Self {
        if text.len() >= 10 && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(millis) = text.parse::<i64>() {
                return RawDate::EpochMillis(millis);
            }
        }
        RawDate::Text(text.to_string())
    }
}

/// One observation before normalization. Dates may repeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub date: RawDate,
    pub value: Option<f64>,
}

impl RawSample {
    pub fn new(date: impl Into<RawDate>, value: Option<f64>) -> Self {
        RawSample {
            date: date.into(),
            value,
        }
    }
}

/// A normalized observation: calendar date plus optional value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Sample { date, value }
    }
}

/// A raw sample tagged with the parcel and index it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelSample {
    pub parcel_id: String,
    pub index: IndexKind,
    pub sample: RawSample,
}

fn parse_value(raw: Option<&str>) -> Result<Option<f64>> {
    match raw {
        None => Ok(None),
        Some(s) if NULL_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m)) => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|_| SeriesError::MalformedInput(format!("invalid index value: {s:?}"))),
    }
}

fn reader_with_headers(csv_object: &str) -> Result<(csv::Reader<&[u8]>, StringRecord)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_object.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| SeriesError::MalformedInput(format!("unreadable CSV header: {e}")))?
        .clone();
    Ok((rdr, headers))
}

fn required_column(headers: &StringRecord, names: &[&str], what: &str) -> Result<usize> {
    find_column(headers, names)
        .ok_or_else(|| SeriesError::MalformedInput(format!("missing required {what} column")))
}

/// Parse a single-series CSV with a `date` column and an `ndvi`/`ndmi` column.
pub fn parse_series_csv(csv_object: &str, index: IndexKind) -> Result<Vec<RawSample>> {
    let (mut rdr, headers) = reader_with_headers(csv_object)?;
    let date_col = required_column(&headers, &DATE_HEADERS, "date")?;
    let value_col = required_column(&headers, &[index.column_name()], index.column_name())?;

    let mut samples = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record =
            record.map_err(|e| SeriesError::MalformedInput(format!("bad row {row}: {e}")))?;
        let date = cell(&record, Some(date_col))
            .ok_or_else(|| SeriesError::MalformedInput(format!("row {row} has no date")))?;
        samples.push(RawSample {
            date: RawDate::from_cell(date),
            value: parse_value(cell(&record, Some(value_col)))?,
        });
    }
    Ok(samples)
}

/// Parse a long-form multi-parcel CSV: `uuid, index, date, value`.
pub fn parse_long_form_csv(csv_object: &str) -> Result<Vec<ParcelSample>> {
    let (mut rdr, headers) = reader_with_headers(csv_object)?;
    let parcel_col = required_column(&headers, &PARCEL_HEADERS, "parcel identifier")?;
    let date_col = required_column(&headers, &DATE_HEADERS, "date")?;
    let index_col = required_column(&headers, &INDEX_HEADERS, "index")?;
    let value_col = required_column(&headers, &VALUE_HEADERS, "value")?;

    let mut samples = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record =
            record.map_err(|e| SeriesError::MalformedInput(format!("bad row {row}: {e}")))?;
        let parcel_id = cell(&record, Some(parcel_col))
            .ok_or_else(|| SeriesError::MalformedInput(format!("row {row} has no parcel id")))?;
        let index = cell(&record, Some(index_col))
            .ok_or_else(|| SeriesError::MalformedInput(format!("row {row} has no index")))?
            .parse::<IndexKind>()?;
        let date = cell(&record, Some(date_col))
            .ok_or_else(|| SeriesError::MalformedInput(format!("row {row} has no date")))?;
        samples.push(ParcelSample {
            parcel_id: parcel_id.to_string(),
            index,
            sample: RawSample {
                date: RawDate::from_cell(date),
                value: parse_value(cell(&record, Some(value_col)))?,
            },
        });
    }
    log::debug!("parsed {} long-form sample row(s)", samples.len());
    Ok(samples)
}
