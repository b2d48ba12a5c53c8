use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// NDMI above which a day counts as high-moisture.
pub const HIGH_NDMI_THRESHOLD: f64 = 0.38;
pub const MEDIUM_NDMI_THRESHOLD: f64 = 0.25;
pub const APPROACHING_LOW_NDMI_THRESHOLD: f64 = 0.20;

/// Moisture class of a parcel-year, from its maximum NDMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoistureLevel {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "approaching low")]
    ApproachingLow,
    #[serde(rename = "low")]
    Low,
}

impl MoistureLevel {
    pub const ALL: [MoistureLevel; 4] = [
        MoistureLevel::High,
        MoistureLevel::Medium,
        MoistureLevel::ApproachingLow,
        MoistureLevel::Low,
    ];

    /// Classify a yearly maximum NDMI. A year without any NDMI is `Low`.
    pub fn from_max_ndmi(max: Option<f64>) -> Self {
        match max {
            Some(m) if m >= HIGH_NDMI_THRESHOLD => MoistureLevel::High,
            Some(m) if m >= MEDIUM_NDMI_THRESHOLD => MoistureLevel::Medium,
            Some(m) if m >= APPROACHING_LOW_NDMI_THRESHOLD => MoistureLevel::ApproachingLow,
            _ => MoistureLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoistureLevel::High => "high",
            MoistureLevel::Medium => "medium",
            MoistureLevel::ApproachingLow => "approaching low",
            MoistureLevel::Low => "low",
        }
    }
}

impl fmt::Display for MoistureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MoistureLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoistureLevel::ALL
            .into_iter()
            .find(|level| level.label() == s)
            .ok_or_else(|| format!("unknown moisture level: {s:?}"))
    }
}
