//! SQL schema for persisted batch results.
//!
//! Regional aggregates (peaks per month, cycle distribution, moisture
//! breakdown) are not stored; they are derived with `GROUP BY` queries.

/// Returns the full SQL schema as a single batch string.
///
/// - `parcels` - parcel identity and WKT boundary
/// - `farm_stats` - per parcel-year peak months, cycles, moisture level
/// - `ndvi_peaks` - individual NDVI peaks with their position in the year
/// - `high_ndmi_days` - per parcel-year high-moisture span in days
/// - `peak_vi_distribution` - per parcel-year NDVI and NDMI maxima
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS parcels (
        parcel_id TEXT PRIMARY KEY,
        region TEXT,
        area_acres REAL,
        geometry TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS farm_stats (
        parcel_id TEXT NOT NULL,
        year INTEGER NOT NULL,
        region TEXT NOT NULL,
        area_acres REAL,
        peak_growth_months TEXT NOT NULL,
        planting_cycles INTEGER NOT NULL,
        moisture_level TEXT NOT NULL,
        PRIMARY KEY (parcel_id, year)
    );
    CREATE INDEX IF NOT EXISTS idx_farm_stats_region ON farm_stats(region);

    CREATE TABLE IF NOT EXISTS ndvi_peaks (
        parcel_id TEXT NOT NULL,
        region TEXT NOT NULL,
        peak_date TEXT NOT NULL,
        peak_value REAL NOT NULL,
        peak_position INTEGER NOT NULL,
        PRIMARY KEY (parcel_id, peak_date)
    );
    CREATE INDEX IF NOT EXISTS idx_ndvi_peaks_region ON ndvi_peaks(region);

    CREATE TABLE IF NOT EXISTS high_ndmi_days (
        parcel_id TEXT NOT NULL,
        region TEXT NOT NULL,
        year INTEGER NOT NULL,
        high_ndmi_days INTEGER NOT NULL,
        PRIMARY KEY (parcel_id, year)
    );
    CREATE INDEX IF NOT EXISTS idx_high_ndmi_region ON high_ndmi_days(region);

    CREATE TABLE IF NOT EXISTS peak_vi_distribution (
        parcel_id TEXT NOT NULL,
        year INTEGER NOT NULL,
        region TEXT NOT NULL,
        ndvi_max REAL,
        ndmi_max REAL,
        PRIMARY KEY (parcel_id, year)
    );
    CREATE INDEX IF NOT EXISTS idx_peak_vi_region ON peak_vi_distribution(region);
    "#
}
