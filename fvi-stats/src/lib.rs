//! Peak & cycle analysis over the combined NDVI/NDMI dataset.

pub mod analyzer;
pub mod moisture;
pub mod peaks;
pub mod tables;

pub use analyzer::analyze;
pub use moisture::MoistureLevel;
pub use peaks::{find_peaks, Peak, PeakParams};
pub use tables::{
    CombinedRow, FarmStatRow, FarmStatsTables, HighMoistureRow, PeakRecord,
    PeakValueDistributionRow, UNKNOWN_REGION,
};
