//! Error types for the vegetation index pipeline

use crate::index::IndexKind;
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Main error type for series ingestion, cleaning, and batch orchestration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// Raw input is structurally invalid (missing date/id column, bad date, bad geometry)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Cleaned output failed its structural contract
    #[error("Schema violation in cleaned {index} series: {} offending row(s)", violations.len())]
    SchemaViolation {
        index: IndexKind,
        violations: Vec<RowViolation>,
    },

    /// More parcels were submitted together than a batch allows
    #[error("Too many parcels in batch (limit: {limit}, found: {found})")]
    BatchTooLarge { limit: usize, found: usize },

    /// The satellite data source failed; propagated unchanged
    #[error("Upstream fetch failed for parcel {parcel_id} ({index}): {message}")]
    UpstreamFetch {
        parcel_id: String,
        index: IndexKind,
        message: String,
    },
}

/// One offending row reported by structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RowViolation {
    /// Position of the row in the validated series
    pub row: usize,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub reason: ViolationReason,
}

/// Why a row failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationReason {
    OutOfRange,
    NotFinite,
    DateNotIncreasing,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::OutOfRange => write!(f, "value outside [-1, 1]"),
            ViolationReason::NotFinite => write!(f, "value is not a finite number"),
            ViolationReason::DateNotIncreasing => write!(f, "date does not follow previous row"),
        }
    }
}

impl fmt::Display for RowViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): {}", self.row, self.date, self.reason)
    }
}

/// Type alias for Results using SeriesError
pub type Result<T> = std::result::Result<T, SeriesError>;
