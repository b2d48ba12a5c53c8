//! Typed regional queries over the stored statistics tables.
//!
//! Monthly peak counts, cycle distributions and moisture breakdowns are
//! derived with `GROUP BY`; the other queries list stored rows for a region.

use crate::models::{
    AnnualCycleDistribution, MoistureBreakdown, MonthlyPeakCount, ParcelInfo, RegionalSummary,
};
use crate::Database;
use fvi_stats::{FarmStatRow, HighMoistureRow, MoistureLevel, PeakValueDistributionRow};
use rusqlite::{params, types::Type};

fn moisture_level(text: String, column: usize) -> rusqlite::Result<MoistureLevel> {
    text.parse::<MoistureLevel>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, e.into()))
}

impl Database {
    /// All stored parcels, ordered by id.
    pub fn query_parcels(&self) -> anyhow::Result<Vec<ParcelInfo>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT parcel_id, region, area_acres, geometry FROM parcels ORDER BY parcel_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ParcelInfo {
                    parcel_id: row.get(0)?,
                    region: row.get(1)?,
                    area_acres: row.get(2)?,
                    geometry: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct region labels present in any statistics table.
    pub fn query_regions(&self) -> anyhow::Result<Vec<String>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT region FROM farm_stats
             UNION SELECT region FROM peak_vi_distribution
             UNION SELECT region FROM high_ndmi_days
             ORDER BY region",
        )?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Farm-year statistics for a region, ordered by parcel then year.
    pub fn query_farm_stats(&self, region: &str) -> anyhow::Result<Vec<FarmStatRow>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT parcel_id, year, region, area_acres, peak_growth_months, planting_cycles, moisture_level
             FROM farm_stats
             WHERE region = ?1
             ORDER BY parcel_id, year",
        )?;
        let rows = stmt
            .query_map(params![region], |row| {
                Ok(FarmStatRow {
                    parcel_id: row.get(0)?,
                    year: row.get(1)?,
                    region: row.get(2)?,
                    area_acres: row.get(3)?,
                    peak_growth_months: row.get(4)?,
                    planting_cycles: row.get(5)?,
                    moisture_level: moisture_level(row.get(6)?, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("query: query_farm_stats returned {} records", rows.len());
        Ok(rows)
    }

    /// NDVI peaks per (year, month) in a region.
    pub fn query_monthly_peaks(&self, region: &str) -> anyhow::Result<Vec<MonthlyPeakCount>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT region,
                    CAST(strftime('%Y', peak_date) AS INTEGER) AS year,
                    CAST(strftime('%m', peak_date) AS INTEGER) AS month,
                    COUNT(*) AS peak_count
             FROM ndvi_peaks
             WHERE region = ?1
             GROUP BY region, year, month
             ORDER BY year, month",
        )?;
        let rows = stmt
            .query_map(params![region], |row| {
                Ok(MonthlyPeakCount {
                    region: row.get(0)?,
                    year: row.get(1)?,
                    month: row.get(2)?,
                    peak_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("query: query_monthly_peaks returned {} records", rows.len());
        Ok(rows)
    }

    /// Number of farms per planting-cycle count, per year, in a region.
    pub fn query_cycle_distribution(&self, region: &str) -> anyhow::Result<Vec<AnnualCycleDistribution>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT region, year, planting_cycles, COUNT(DISTINCT parcel_id) AS farm_count
             FROM farm_stats
             WHERE region = ?1
             GROUP BY region, year, planting_cycles
             ORDER BY year, planting_cycles",
        )?;
        let rows = stmt
            .query_map(params![region], |row| {
                Ok(AnnualCycleDistribution {
                    region: row.get(0)?,
                    year: row.get(1)?,
                    planting_cycles: row.get(2)?,
                    farm_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("query: query_cycle_distribution returned {} records", rows.len());
        Ok(rows)
    }

    /// Farm-years per moisture level in a region, most common first.
    pub fn query_moisture_breakdown(&self, region: &str) -> anyhow::Result<Vec<MoistureBreakdown>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT region, moisture_level, COUNT(*) AS farm_years
             FROM farm_stats
             WHERE region = ?1
             GROUP BY region, moisture_level
             ORDER BY farm_years DESC, moisture_level",
        )?;
        let rows = stmt
            .query_map(params![region], |row| {
                Ok(MoistureBreakdown {
                    region: row.get(0)?,
                    moisture_level: moisture_level(row.get(1)?, 1)?,
                    farm_years: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// High-moisture spans for a region, ordered by parcel then year.
    pub fn query_high_moisture(&self, region: &str) -> anyhow::Result<Vec<HighMoistureRow>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT parcel_id, region, year, high_ndmi_days
             FROM high_ndmi_days
             WHERE region = ?1
             ORDER BY parcel_id, year",
        )?;
        let rows = stmt
            .query_map(params![region], |row| {
                Ok(HighMoistureRow {
                    parcel_id: row.get(0)?,
                    region: row.get(1)?,
                    year: row.get(2)?,
                    high_ndmi_days: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Yearly NDVI/NDMI maxima for a region, ordered by parcel then year.
    pub fn query_peak_distribution(&self, region: &str) -> anyhow::Result<Vec<PeakValueDistributionRow>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT parcel_id, year, region, ndvi_max, ndmi_max
             FROM peak_vi_distribution
             WHERE region = ?1
             ORDER BY parcel_id, year",
        )?;
        let rows = stmt
            .query_map(params![region], |row| {
                Ok(PeakValueDistributionRow {
                    parcel_id: row.get(0)?,
                    year: row.get(1)?,
                    region: row.get(2)?,
                    ndvi_max: row.get(3)?,
                    ndmi_max: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All roll-ups for one region.
    pub fn query_regional_summary(&self, region: &str) -> anyhow::Result<RegionalSummary> {
        Ok(RegionalSummary {
            region: region.to_string(),
            farm_stats: self.query_farm_stats(region)?,
            monthly_peaks: self.query_monthly_peaks(region)?,
            cycle_distribution: self.query_cycle_distribution(region)?,
            moisture_breakdown: self.query_moisture_breakdown(region)?,
            high_moisture: self.query_high_moisture(region)?,
            peak_distribution: self.query_peak_distribution(region)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::loader::tests::sample_db;
    use fvi_stats::MoistureLevel;

    #[test]
    fn query_regions_is_sorted_and_distinct() {
        let db = sample_db();
        assert_eq!(db.query_regions().unwrap(), vec!["Kisumu", "Nakuru"]);
    }

    #[test]
    fn query_parcels_round_trips_geometry() {
        let db = sample_db();
        let parcels = db.query_parcels().unwrap();
        assert_eq!(parcels.len(), 3);
        assert_eq!(parcels[0].parcel_id, "farm-1");
        assert!(parcels[0].geometry.starts_with("POLYGON (("));
        assert_eq!(parcels[0].area_acres, Some(2.5));
    }

    #[test]
    fn query_farm_stats_filters_by_region() {
        let db = sample_db();
        let stats = db.query_farm_stats("Nakuru").unwrap();
        let keys: Vec<(&str, i32)> = stats.iter().map(|s| (s.parcel_id.as_str(), s.year)).collect();
        assert_eq!(keys, vec![("farm-1", 2024), ("farm-2", 2023), ("farm-2", 2024)]);
        assert_eq!(stats[0].moisture_level, MoistureLevel::High);
        assert_eq!(stats[0].peak_growth_months, "4 9");
    }

    #[test]
    fn query_monthly_peaks_groups_by_month() {
        let db = sample_db();
        let counts: Vec<(i32, u32, i64)> = db
            .query_monthly_peaks("Nakuru")
            .unwrap()
            .iter()
            .map(|c| (c.year, c.month, c.peak_count))
            .collect();
        assert_eq!(counts, vec![(2023, 5, 1), (2024, 4, 2), (2024, 9, 1)]);
    }

    #[test]
    fn query_cycle_distribution_counts_farms() {
        let db = sample_db();
        let dist: Vec<(i32, u32, i64)> = db
            .query_cycle_distribution("Nakuru")
            .unwrap()
            .iter()
            .map(|d| (d.year, d.planting_cycles, d.farm_count))
            .collect();
        assert_eq!(dist, vec![(2023, 1, 1), (2024, 1, 1), (2024, 2, 1)]);
    }

    #[test]
    fn query_moisture_breakdown_most_common_first() {
        let db = sample_db();
        let breakdown = db.query_moisture_breakdown("Nakuru").unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].moisture_level, MoistureLevel::High);
        assert_eq!(breakdown[0].farm_years, 2);
        assert_eq!(breakdown[1].moisture_level, MoistureLevel::Medium);
    }

    #[test]
    fn query_listings_for_region() {
        let db = sample_db();
        assert_eq!(db.query_high_moisture("Nakuru").unwrap().len(), 2);
        assert!(db.query_high_moisture("Kisumu").unwrap().is_empty());
        let peaks = db.query_peak_distribution("Kisumu").unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].ndmi_max, None);
    }

    #[test]
    fn regional_summary_serializes() {
        let db = sample_db();
        let summary = db.query_regional_summary("Nakuru").unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["region"], "Nakuru");
        assert_eq!(json["moisture_breakdown"][0]["moisture_level"], "high");
        assert_eq!(json["monthly_peaks"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn unknown_region_is_empty() {
        let db = sample_db();
        let summary = db.query_regional_summary("Atlantis").unwrap();
        assert!(summary.farm_stats.is_empty());
        assert!(summary.monthly_peaks.is_empty());
    }
}
