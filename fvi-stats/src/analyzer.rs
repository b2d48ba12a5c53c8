use crate::moisture::{MoistureLevel, HIGH_NDMI_THRESHOLD};
use crate::peaks::{find_peaks, PeakParams};
use crate::tables::{
    CombinedRow, FarmStatRow, FarmStatsTables, HighMoistureRow, PeakRecord,
    PeakValueDistributionRow, UNKNOWN_REGION,
};
use chrono::{Datelike, NaiveDate};
use fvi_utils::dates::days_between;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// Running aggregates for one parcel-year.
#[derive(Debug, Default)]
struct YearSummary {
    ndvi_max: Option<f64>,
    ndmi_max: Option<f64>,
    high_first: Option<NaiveDate>,
    high_last: Option<NaiveDate>,
    peak_months: BTreeSet<u32>,
    peak_count: u32,
}

fn max_option(current: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (current, value) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn round_area(area: f64) -> f64 {
    (area * 1000.0).round() / 1000.0
}

/// Derive the four statistics tables from the combined dataset.
///
/// Peaks are detected over each parcel's whole NDVI series and then grouped
/// by calendar year. Rows are ordered by parcel id, then year or date.
pub fn analyze(rows: &[CombinedRow], params: &PeakParams) -> FarmStatsTables {
    let mut by_parcel: BTreeMap<&str, Vec<&CombinedRow>> = BTreeMap::new();
    for row in rows {
        by_parcel.entry(row.parcel_id.as_str()).or_default().push(row);
    }

    let mut tables = FarmStatsTables::default();
    for (parcel_id, mut parcel_rows) in by_parcel {
        parcel_rows.sort_by_key(|r| r.date);
        analyze_parcel(parcel_id, &parcel_rows, params, &mut tables);
    }
    info!(
        "analyzed {} row(s): {} farm-year(s), {} peak(s)",
        rows.len(),
        tables.farm_stats.len(),
        tables.ndvi_peaks_per_farm.len()
    );
    tables
}

fn analyze_parcel(
    parcel_id: &str,
    rows: &[&CombinedRow],
    params: &PeakParams,
    tables: &mut FarmStatsTables,
) {
    let region = rows
        .iter()
        .find_map(|r| r.region.clone())
        .unwrap_or_else(|| UNKNOWN_REGION.to_string());
    let area_acres = rows.iter().find_map(|r| r.area_acres).map(round_area);

    let mut years: BTreeMap<i32, YearSummary> = BTreeMap::new();
    for row in rows {
        let summary = years.entry(row.date.year()).or_default();
        summary.ndvi_max = max_option(summary.ndvi_max, row.ndvi);
        summary.ndmi_max = max_option(summary.ndmi_max, row.ndmi);
        if row.ndmi.is_some_and(|v| v > HIGH_NDMI_THRESHOLD) {
            summary.high_first.get_or_insert(row.date);
            summary.high_last = Some(row.date);
        }
    }

    let ndvi: Vec<f64> = rows.iter().map(|r| r.ndvi.unwrap_or(f64::NAN)).collect();
    let peaks = find_peaks(&ndvi, params);
    debug!("parcel {parcel_id}: {} NDVI peak(s)", peaks.len());
    for peak in &peaks {
        let date = rows[peak.index].date;
        let summary = years.entry(date.year()).or_default();
        summary.peak_count += 1;
        summary.peak_months.insert(date.month());
        tables.ndvi_peaks_per_farm.push(PeakRecord {
            parcel_id: parcel_id.to_string(),
            region: region.clone(),
            peak_date: date,
            peak_value: peak.value,
            peak_position: summary.peak_count,
        });
    }

    for (year, summary) in years {
        tables.peak_vi_distribution.push(PeakValueDistributionRow {
            parcel_id: parcel_id.to_string(),
            year,
            region: region.clone(),
            ndvi_max: summary.ndvi_max,
            ndmi_max: summary.ndmi_max,
        });
        if let (Some(first), Some(last)) = (summary.high_first, summary.high_last) {
            tables.high_ndmi_days.push(HighMoistureRow {
                parcel_id: parcel_id.to_string(),
                region: region.clone(),
                year,
                high_ndmi_days: days_between(&first, &last),
            });
        }
        if summary.peak_count > 0 {
            let months: Vec<String> = summary.peak_months.iter().map(u32::to_string).collect();
            tables.farm_stats.push(FarmStatRow {
                parcel_id: parcel_id.to_string(),
                year,
                region: region.clone(),
                area_acres,
                peak_growth_months: months.join(" "),
                planting_cycles: summary.peak_count,
                moisture_level: MoistureLevel::from_max_ndmi(summary.ndmi_max),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Daily rows over `[start, start + days)` with NDVI spikes on `peaks`.
    fn daily(parcel: &str, start: NaiveDate, days: u64, peaks: &[NaiveDate], ndmi: f64) -> Vec<CombinedRow> {
        (0..days)
            .map(|i| {
                let date = start + Days::new(i);
                CombinedRow {
                    parcel_id: parcel.to_string(),
                    region: Some("Nakuru".to_string()),
                    area_acres: Some(2.34567),
                    date,
                    ndvi: Some(if peaks.contains(&date) { 0.7 } else { 0.1 }),
                    ndmi: Some(ndmi),
                }
            })
            .collect()
    }

    #[test]
    fn counts_cycles_and_months() {
        let peaks = [d(2024, 4, 3), d(2024, 4, 20), d(2024, 9, 5), d(2024, 9, 25)];
        let rows = daily("farm-1", d(2024, 1, 1), 366, &peaks, 0.22);
        let tables = analyze(&rows, &PeakParams::default());

        assert_eq!(tables.farm_stats.len(), 1);
        let stats = &tables.farm_stats[0];
        assert_eq!(stats.year, 2024);
        assert_eq!(stats.planting_cycles, 4);
        assert_eq!(stats.peak_growth_months, "4 9");
        assert_eq!(stats.moisture_level, MoistureLevel::ApproachingLow);
        assert_eq!(stats.area_acres, Some(2.346));
        assert_eq!(stats.region, "Nakuru");
    }

    #[test]
    fn ordinals_are_contiguous_per_year() {
        let peaks = [d(2023, 5, 1), d(2023, 8, 1), d(2024, 3, 1), d(2024, 6, 1), d(2024, 10, 1)];
        let rows = daily("farm-1", d(2023, 1, 1), 730, &peaks, 0.1);
        let tables = analyze(&rows, &PeakParams::default());

        let positions: Vec<(i32, u32)> = tables
            .ndvi_peaks_per_farm
            .iter()
            .map(|p| (p.peak_date.year(), p.peak_position))
            .collect();
        assert_eq!(positions, vec![(2023, 1), (2023, 2), (2024, 1), (2024, 2), (2024, 3)]);
        assert!(tables.ndvi_peaks_per_farm.iter().all(|p| (p.peak_value - 0.7).abs() < 1e-12));
    }

    #[test]
    fn high_moisture_span_in_days() {
        let mut rows = daily("farm-1", d(2024, 1, 1), 60, &[], 0.2);
        rows[10].ndmi = Some(0.39);
        rows[25].ndmi = Some(0.38);
        rows[40].ndmi = Some(0.45);
        let tables = analyze(&rows, &PeakParams::default());
        assert_eq!(tables.high_ndmi_days.len(), 1);
        assert_eq!(tables.high_ndmi_days[0].high_ndmi_days, 30);
        let distribution = &tables.peak_vi_distribution[0];
        assert_eq!(distribution.ndmi_max, Some(0.45));
        assert_eq!(distribution.ndvi_max, Some(0.1));
    }

    #[test]
    fn year_without_peaks_has_no_farm_stat() {
        let rows = daily("farm-1", d(2024, 1, 1), 100, &[], 0.4);
        let tables = analyze(&rows, &PeakParams::default());
        assert!(tables.farm_stats.is_empty());
        assert!(tables.ndvi_peaks_per_farm.is_empty());
        assert_eq!(tables.peak_vi_distribution.len(), 1);
    }

    #[test]
    fn missing_region_and_area() {
        let mut rows = daily("farm-1", d(2024, 1, 1), 60, &[d(2024, 1, 20)], 0.4);
        for row in rows.iter_mut() {
            row.region = None;
            row.area_acres = None;
        }
        let tables = analyze(&rows, &PeakParams::default());
        let stats = &tables.farm_stats[0];
        assert_eq!(stats.region, UNKNOWN_REGION);
        assert_eq!(stats.area_acres, None);
        assert_eq!(stats.moisture_level, MoistureLevel::High);
    }

    #[test]
    fn parcels_are_analyzed_separately() {
        let mut rows = daily("farm-b", d(2024, 1, 1), 40, &[d(2024, 1, 10)], 0.3);
        rows.extend(daily("farm-a", d(2024, 1, 1), 40, &[d(2024, 1, 12)], 0.3));
        let tables = analyze(&rows, &PeakParams::default());
        let ids: Vec<&str> = tables.farm_stats.iter().map(|s| s.parcel_id.as_str()).collect();
        assert_eq!(ids, vec!["farm-a", "farm-b"]);
        assert!(tables.farm_stats.iter().all(|s| s.moisture_level == MoistureLevel::Medium));
    }

    #[test]
    fn empty_input() {
        assert!(analyze(&[], &PeakParams::default()).is_empty());
    }
}
