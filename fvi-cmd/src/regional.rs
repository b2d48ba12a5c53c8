//! Regional roll-ups from a persisted database.

use fvi_db::models::RegionalSummary;
use fvi_db::Database;
use log::info;

/// Summaries for `region`, or for every stored region when none is given.
pub fn regional_summaries(db: &Database, region: Option<&str>) -> anyhow::Result<Vec<RegionalSummary>> {
    let regions = match region {
        Some(region) => vec![region.to_string()],
        None => db.query_regions()?,
    };
    regions
        .iter()
        .map(|region| db.query_regional_summary(region))
        .collect()
}

pub async fn run_regional(database: &str, region: Option<&str>, output: Option<&str>) -> anyhow::Result<()> {
    if !std::path::Path::new(database).exists() {
        anyhow::bail!("database {database} not found. Run `analyze --database` first.");
    }
    let db = Database::open(database)?;
    let summaries = regional_summaries(&db, region)?;
    info!("Summarized {} region(s)", summaries.len());

    let json = serde_json::to_string_pretty(&summaries)?;
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
