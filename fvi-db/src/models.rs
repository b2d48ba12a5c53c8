//! Query result models for the regional roll-ups.
//!
//! All structs derive `Serialize` so the CLI can emit them as JSON.

use fvi_stats::{FarmStatRow, HighMoistureRow, MoistureLevel, PeakValueDistributionRow};
use serde::Serialize;

/// A stored parcel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ParcelInfo {
    pub parcel_id: String,
    pub region: Option<String>,
    pub area_acres: Option<f64>,
    /// WKT polygon
    pub geometry: String,
}

/// Number of NDVI peaks falling in one month of one year.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyPeakCount {
    pub region: String,
    pub year: i32,
    pub month: u32,
    pub peak_count: i64,
}

/// How many farms had a given number of planting cycles in a year.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnnualCycleDistribution {
    pub region: String,
    pub year: i32,
    pub planting_cycles: u32,
    pub farm_count: i64,
}

/// Farm-years per moisture level.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MoistureBreakdown {
    pub region: String,
    pub moisture_level: MoistureLevel,
    pub farm_years: i64,
}

/// Everything stored for one region.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionalSummary {
    pub region: String,
    pub farm_stats: Vec<FarmStatRow>,
    pub monthly_peaks: Vec<MonthlyPeakCount>,
    pub cycle_distribution: Vec<AnnualCycleDistribution>,
    pub moisture_breakdown: Vec<MoistureBreakdown>,
    pub high_moisture: Vec<HighMoistureRow>,
    pub peak_distribution: Vec<PeakValueDistributionRow>,
}
