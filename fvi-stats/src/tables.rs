use crate::moisture::MoistureLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Region label reported when a parcel has none.
pub const UNKNOWN_REGION: &str = "Unknown";

/// One date of the combined NDVI/NDMI dataset for a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRow {
    pub parcel_id: String,
    pub region: Option<String>,
    pub area_acres: Option<f64>,
    pub date: NaiveDate,
    pub ndvi: Option<f64>,
    pub ndmi: Option<f64>,
}

/// Per parcel and year: peak months, planting cycles, moisture class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmStatRow {
    pub parcel_id: String,
    pub year: i32,
    pub region: String,
    pub area_acres: Option<f64>,
    /// Sorted distinct months with an NDVI peak, space separated
    pub peak_growth_months: String,
    pub planting_cycles: u32,
    pub moisture_level: MoistureLevel,
}

/// One accepted NDVI peak with its 1-based position within its calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    pub parcel_id: String,
    pub region: String,
    pub peak_date: NaiveDate,
    pub peak_value: f64,
    pub peak_position: u32,
}

/// Days between the first and last high-NDMI date of a year.
///
/// This is a span, not a count of qualifying days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighMoistureRow {
    pub parcel_id: String,
    pub region: String,
    pub year: i32,
    pub high_ndmi_days: i64,
}

/// Yearly maxima of both indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakValueDistributionRow {
    pub parcel_id: String,
    pub year: i32,
    pub region: String,
    pub ndvi_max: Option<f64>,
    pub ndmi_max: Option<f64>,
}

/// The four row-sets produced for one batch, keyed by table name when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmStatsTables {
    pub farm_stats: Vec<FarmStatRow>,
    pub peak_vi_distribution: Vec<PeakValueDistributionRow>,
    pub high_ndmi_days: Vec<HighMoistureRow>,
    pub ndvi_peaks_per_farm: Vec<PeakRecord>,
}

impl FarmStatsTables {
    pub const TABLE_NAMES: [&'static str; 4] = [
        "farm_stats",
        "peak_vi_distribution",
        "high_ndmi_days",
        "ndvi_peaks_per_farm",
    ];

    pub fn is_empty(&self) -> bool {
        self.farm_stats.is_empty()
            && self.peak_vi_distribution.is_empty()
            && self.high_ndmi_days.is_empty()
            && self.ndvi_peaks_per_farm.is_empty()
    }

    /// Row count per table, in `TABLE_NAMES` order.
    pub fn row_counts(&self) -> [(&'static str, usize); 4] {
        [
            (Self::TABLE_NAMES[0], self.farm_stats.len()),
            (Self::TABLE_NAMES[1], self.peak_vi_distribution.len()),
            (Self::TABLE_NAMES[2], self.high_ndmi_days.len()),
            (Self::TABLE_NAMES[3], self.ndvi_peaks_per_farm.len()),
        ]
    }
}
