//! Transactional inserts of one batch's parcels and statistics tables.
//!
//! A batch is written in a single transaction. Rows are inserted without
//! `OR REPLACE`, so a primary-key clash aborts and rolls back the batch.

use crate::Database;
use fvi_series::ParcelRef;
use fvi_stats::FarmStatsTables;
use fvi_utils::dates::format_date;
use rusqlite::params;

impl Database {
    /// Insert the parcels and all four tables of a batch atomically.
    pub fn insert_batch(&self, parcels: &[ParcelRef], tables: &FarmStatsTables) -> anyhow::Result<()> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;

        for parcel in parcels {
            tx.execute(
                "INSERT INTO parcels (parcel_id, region, area_acres, geometry)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    parcel.id(),
                    parcel.region(),
                    parcel.area_acres(),
                    parcel.polygon().to_wkt()
                ],
            )?;
        }

        for row in &tables.farm_stats {
            tx.execute(
                "INSERT INTO farm_stats
                 (parcel_id, year, region, area_acres, peak_growth_months, planting_cycles, moisture_level)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.parcel_id,
                    row.year,
                    row.region,
                    row.area_acres,
                    row.peak_growth_months,
                    row.planting_cycles,
                    row.moisture_level.label()
                ],
            )?;
        }

        for row in &tables.ndvi_peaks_per_farm {
            tx.execute(
                "INSERT INTO ndvi_peaks (parcel_id, region, peak_date, peak_value, peak_position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.parcel_id,
                    row.region,
                    format_date(&row.peak_date),
                    row.peak_value,
                    row.peak_position
                ],
            )?;
        }

        for row in &tables.high_ndmi_days {
            tx.execute(
                "INSERT INTO high_ndmi_days (parcel_id, region, year, high_ndmi_days)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row.parcel_id, row.region, row.year, row.high_ndmi_days],
            )?;
        }

        for row in &tables.peak_vi_distribution {
            tx.execute(
                "INSERT INTO peak_vi_distribution (parcel_id, year, region, ndvi_max, ndmi_max)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.parcel_id, row.year, row.region, row.ndvi_max, row.ndmi_max],
            )?;
        }

        tx.commit()?;
        log::info!(
            "loader: stored {} parcel(s), {} farm-year(s), {} peak(s)",
            parcels.len(),
            tables.farm_stats.len(),
            tables.ndvi_peaks_per_farm.len()
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fvi_series::Polygon;
    use fvi_stats::{
        FarmStatRow, HighMoistureRow, MoistureLevel, PeakRecord, PeakValueDistributionRow,
    };

    pub(crate) fn parcel(id: &str, region: Option<&str>) -> ParcelRef {
        let polygon = Polygon::from_wkt("POLYGON ((36 -1, 36.1 -1, 36.1 -0.9, 36 -0.9, 36 -1))").unwrap();
        ParcelRef::new(id, region.map(str::to_string), Some(2.5), polygon).unwrap()
    }

    fn peak(parcel_id: &str, region: &str, date: NaiveDate, position: u32) -> PeakRecord {
        PeakRecord {
            parcel_id: parcel_id.to_string(),
            region: region.to_string(),
            peak_date: date,
            peak_value: 0.7,
            peak_position: position,
        }
    }

    /// Two farms in Nakuru, one in Kisumu, with 2023 and 2024 results.
    pub(crate) fn sample_tables() -> FarmStatsTables {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let stat = |id: &str, region: &str, year: i32, months: &str, cycles: u32, level: MoistureLevel| FarmStatRow {
            parcel_id: id.to_string(),
            year,
            region: region.to_string(),
            area_acres: Some(2.5),
            peak_growth_months: months.to_string(),
            planting_cycles: cycles,
            moisture_level: level,
        };
        FarmStatsTables {
            farm_stats: vec![
                stat("farm-1", "Nakuru", 2024, "4 9", 2, MoistureLevel::High),
                stat("farm-2", "Nakuru", 2024, "4", 1, MoistureLevel::Medium),
                stat("farm-2", "Nakuru", 2023, "5", 1, MoistureLevel::High),
                stat("farm-3", "Kisumu", 2024, "3", 1, MoistureLevel::Low),
            ],
            ndvi_peaks_per_farm: vec![
                peak("farm-1", "Nakuru", d(2024, 4, 3), 1),
                peak("farm-1", "Nakuru", d(2024, 9, 5), 2),
                peak("farm-2", "Nakuru", d(2024, 4, 20), 1),
                peak("farm-2", "Nakuru", d(2023, 5, 2), 1),
                peak("farm-3", "Kisumu", d(2024, 3, 9), 1),
            ],
            high_ndmi_days: vec![
                HighMoistureRow {
                    parcel_id: "farm-1".to_string(),
                    region: "Nakuru".to_string(),
                    year: 2024,
                    high_ndmi_days: 40,
                },
                HighMoistureRow {
                    parcel_id: "farm-2".to_string(),
                    region: "Nakuru".to_string(),
                    year: 2023,
                    high_ndmi_days: 12,
                },
            ],
            peak_vi_distribution: vec![
                PeakValueDistributionRow {
                    parcel_id: "farm-1".to_string(),
                    year: 2024,
                    region: "Nakuru".to_string(),
                    ndvi_max: Some(0.72),
                    ndmi_max: Some(0.41),
                },
                PeakValueDistributionRow {
                    parcel_id: "farm-3".to_string(),
                    year: 2024,
                    region: "Kisumu".to_string(),
                    ndvi_max: Some(0.55),
                    ndmi_max: None,
                },
            ],
        }
    }

    pub(crate) fn sample_db() -> Database {
        let db = Database::new().unwrap();
        let parcels = [
            parcel("farm-1", Some("Nakuru")),
            parcel("farm-2", Some("Nakuru")),
            parcel("farm-3", Some("Kisumu")),
        ];
        db.insert_batch(&parcels, &sample_tables()).unwrap();
        db
    }

    #[test]
    fn insert_batch_stores_every_table() {
        let db = sample_db();
        let conn = db.conn.borrow();
        for (table, expected) in [
            ("parcels", 3),
            ("farm_stats", 4),
            ("ndvi_peaks", 5),
            ("high_ndmi_days", 2),
            ("peak_vi_distribution", 2),
        ] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, expected, "row count of {table}");
        }
    }

    #[test]
    fn duplicate_batch_rolls_back() {
        let db = sample_db();
        let tables = FarmStatsTables {
            farm_stats: sample_tables().farm_stats[..1].to_vec(),
            ..Default::default()
        };
        // the new parcel is fine, the farm_stats row clashes
        let result = db.insert_batch(&[parcel("farm-9", None)], &tables);
        assert!(result.is_err());
        let ids: Vec<String> = db.query_parcels().unwrap().into_iter().map(|p| p.parcel_id).collect();
        assert!(!ids.contains(&"farm-9".to_string()));
    }

    #[test]
    fn sink_writes_through_database() {
        use fvi_batch::TableSink;
        let db = Database::new().unwrap();
        let sink: &dyn TableSink = &db;
        sink.write_batch(&[parcel("farm-1", None)], &sample_tables()).unwrap();
        assert_eq!(db.query_parcels().unwrap()[0].region, None);
    }
}
