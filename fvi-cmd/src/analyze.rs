//! Run the vegetation index pipeline over parcels and samples read from CSV.

use fvi_batch::{run_batch, BatchConfig, BatchOutput, DEFAULT_LOOKBACK_YEARS, MAX_BATCH_SIZE};
use fvi_db::Database;
use fvi_series::{DateRange, InMemorySource, ParcelRef, ParcelSubmission};
use fvi_stats::FarmStatsTables;
use fvi_utils::dates::parse_flexible;
use log::info;
use serde::Serialize;

/// Merged results of every batch in one run.
#[derive(Debug, Default, Serialize)]
pub struct AnalysisReport {
    pub parcels: Vec<ParcelRef>,
    pub tables: FarmStatsTables,
}

impl AnalysisReport {
    fn absorb(&mut self, output: BatchOutput) {
        self.parcels.extend(output.parcels);
        let tables = output.tables;
        self.tables.farm_stats.extend(tables.farm_stats);
        self.tables.peak_vi_distribution.extend(tables.peak_vi_distribution);
        self.tables.high_ndmi_days.extend(tables.high_ndmi_days);
        self.tables.ndvi_peaks_per_farm.extend(tables.ndvi_peaks_per_farm);
    }
}

/// Fetch window from an explicit start/end pair, or the trailing `lookback_years`.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    lookback_years: Option<u32>,
) -> anyhow::Result<DateRange> {
    let end_date = match end {
        Some(end) => parse_flexible(end)?,
        None => chrono::Local::now().date_naive(),
    };
    let range = match start {
        Some(start) => DateRange(parse_flexible(start)?, end_date),
        None => DateRange::trailing_years(end_date, lookback_years.unwrap_or(DEFAULT_LOOKBACK_YEARS)),
    };
    if range.is_empty() {
        anyhow::bail!("start date {} is after end date {}", range.start(), range.end());
    }
    Ok(range)
}

/// Split the parcels into batches of at most `MAX_BATCH_SIZE` and run each one.
pub fn analyze_parcels(
    parcels_csv: &str,
    samples_csv: &str,
    config: &BatchConfig,
) -> anyhow::Result<Vec<BatchOutput>> {
    let submissions = ParcelSubmission::parse_parcel_csv(parcels_csv)?;
    let source = InMemorySource::from_csv(samples_csv)?;
    info!(
        "Analyzing {} parcel(s) between {} and {}",
        submissions.len(),
        config.range.start(),
        config.range.end()
    );

    let mut outputs = Vec::new();
    for chunk in submissions.chunks(MAX_BATCH_SIZE) {
        outputs.push(run_batch(chunk.to_vec(), &source, config)?);
    }
    Ok(outputs)
}

pub async fn run_analyze(
    parcels_path: &str,
    samples_path: &str,
    output: Option<&str>,
    database: Option<&str>,
    range: DateRange,
) -> anyhow::Result<()> {
    let parcels_csv = std::fs::read_to_string(parcels_path)?;
    let samples_csv = std::fs::read_to_string(samples_path)?;
    let config = BatchConfig::with_range(range);
    let outputs = analyze_parcels(&parcels_csv, &samples_csv, &config)?;

    if let Some(path) = database {
        let db = Database::open(path)?;
        for batch in &outputs {
            batch.persist(&db)?;
        }
        info!("Stored {} batch(es) in {}", outputs.len(), path);
    }

    let mut report = AnalysisReport::default();
    for batch in outputs {
        report.absorb(batch);
    }
    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Analysis complete. Output: {}", path);
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use std::fmt::Write;

    const SQUARE: &str = "POLYGON ((36 -1, 36.1 -1, 36.1 -0.9, 36 -0.9, 36 -1))";

    fn parcels_csv(n: usize) -> String {
        let mut csv = String::from("uuid,region,area (acres),geometry\n");
        for i in 0..n {
            writeln!(csv, "farm-{i},Nakuru,1.25,\"{SQUARE}\"").unwrap();
        }
        csv
    }

    fn samples_csv(n: usize) -> String {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut csv = String::from("uuid,index,date,value\n");
        for i in 0..n {
            for step in 0..60u64 {
                let date = start + Days::new(5 * step);
                let phase = step as f64 * 5.0 * std::f64::consts::TAU / 180.0;
                writeln!(csv, "farm-{i},ndvi,{date},{}", 0.45 + 0.3 * phase.sin()).unwrap();
                writeln!(csv, "farm-{i},ndmi,{date},{}", 0.3 + 0.1 * phase.cos()).unwrap();
            }
        }
        csv
    }

    fn config() -> BatchConfig {
        BatchConfig::with_range(resolve_window(Some("2024-01-01"), Some("2024-12-31"), None).unwrap())
    }

    #[test]
    fn resolve_window_variants() {
        let explicit = resolve_window(Some("2023-01-01"), Some("2023-06-30"), None).unwrap();
        assert_eq!(explicit.start(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        let lookback = resolve_window(None, Some("2024-06-30"), Some(2)).unwrap();
        assert_eq!(lookback.start(), NaiveDate::from_ymd_opt(2022, 6, 30).unwrap());
        assert!(resolve_window(Some("2024-02-01"), Some("2024-01-01"), None).is_err());
    }

    #[test]
    fn large_uploads_are_split_into_batches() {
        let outputs = analyze_parcels(&parcels_csv(7), &samples_csv(7), &config()).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].parcels.len(), 5);
        assert_eq!(outputs[1].parcels.len(), 2);
        assert_eq!(outputs[1].parcels[1].id(), "farm-6");
    }

    #[test]
    fn missing_samples_fail_the_run() {
        let result = analyze_parcels(&parcels_csv(2), &samples_csv(1), &config());
        assert!(result.is_err());
    }

    #[test]
    fn outputs_persist_to_database() {
        let outputs = analyze_parcels(&parcels_csv(2), &samples_csv(2), &config()).unwrap();
        let db = Database::new().unwrap();
        outputs[0].persist(&db).unwrap();
        assert_eq!(db.query_parcels().unwrap().len(), 2);
        assert_eq!(db.query_peak_distribution("Nakuru").unwrap().len(), 2);
    }

    #[test]
    fn report_merges_batches() {
        let outputs = analyze_parcels(&parcels_csv(6), &samples_csv(6), &config()).unwrap();
        let mut report = AnalysisReport::default();
        for batch in outputs {
            report.absorb(batch);
        }
        assert_eq!(report.parcels.len(), 6);
        assert_eq!(report.tables.peak_vi_distribution.len(), 6);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["tables"]["farm_stats"].is_array());
    }
}
