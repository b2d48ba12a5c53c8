//! Parcel, sample, and index types plus the series normalizer.

pub mod date_range;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod parcel;
pub mod sample;
pub mod source;

pub use date_range::DateRange;
pub use error::{Result, RowViolation, SeriesError, ViolationReason};
pub use index::IndexKind;
pub use normalizer::normalize;
pub use parcel::{ParcelRef, ParcelSubmission, Polygon};
pub use sample::{RawDate, RawSample, Sample};
pub use source::{InMemorySource, SeriesSource};
