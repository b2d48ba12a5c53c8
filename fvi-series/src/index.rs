use crate::error::SeriesError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Sentinel-2 band names used by the index formulas.
pub const BAND_NIR: &str = "B8";
pub const BAND_RED: &str = "B4";
pub const BAND_SWIR1: &str = "B11";

/// A normalized-difference index computed from two Sentinel-2 bands.
///
/// Both indices are bounded to [-1, 1] by construction.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Vegetation greenness: (NIR - Red) / (NIR + Red)
    Ndvi,
    /// Plant/soil moisture: (NIR - SWIR1) / (NIR + SWIR1)
    Ndmi,
}

impl IndexKind {
    pub const ALL: [IndexKind; 2] = [IndexKind::Ndvi, IndexKind::Ndmi];

    /// Column name used in tabular input and output.
    pub fn column_name(&self) -> &'static str {
        match self {
            IndexKind::Ndvi => "ndvi",
            IndexKind::Ndmi => "ndmi",
        }
    }

    /// The (first, second) bands of the normalized difference.
    pub fn bands(&self) -> (&'static str, &'static str) {
        match self {
            IndexKind::Ndvi => (BAND_NIR, BAND_RED),
            IndexKind::Ndmi => (BAND_NIR, BAND_SWIR1),
        }
    }

    /// Apply the band-combination rule to surface reflectances.
    ///
    /// Returns `None` when both reflectances sum to zero.
    pub fn normalized_difference(&self, first: f64, second: f64) -> Option<f64> {
        let sum = first + second;
        if sum == 0.0 || !sum.is_finite() {
            return None;
        }
        Some((first - second) / sum)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

impl FromStr for IndexKind {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ndvi" => Ok(IndexKind::Ndvi),
            "ndmi" => Ok(IndexKind::Ndmi),
            other => Err(SeriesError::MalformedInput(format!(
                "unknown index name: {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("NDVI".parse::<IndexKind>().unwrap(), IndexKind::Ndvi);
        assert_eq!(" ndmi ".parse::<IndexKind>().unwrap(), IndexKind::Ndmi);
        assert!(matches!(
            "evi".parse::<IndexKind>(),
            Err(SeriesError::MalformedInput(_))
        ));
    }

    #[test]
    fn band_rules() {
        assert_eq!(IndexKind::Ndvi.bands(), ("B8", "B4"));
        assert_eq!(IndexKind::Ndmi.bands(), ("B8", "B11"));
        let ndvi = IndexKind::Ndvi.normalized_difference(0.5, 0.1).unwrap();
        assert!((ndvi - 0.4 / 0.6).abs() < 1e-12);
        assert!(IndexKind::Ndmi.normalized_difference(0.0, 0.0).is_none());
    }

    #[test]
    fn display_matches_column_name() {
        for index in IndexKind::ALL {
            assert_eq!(index.to_string(), index.column_name());
        }
    }
}
