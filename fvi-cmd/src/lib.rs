//! Command implementations for the FVI CLI.
//!
//! Provides subcommands for analyzing parcels, summarizing stored results
//! by region, and looking up soil attributes.

use clap::Subcommand;

pub mod analyze;
pub mod regional;
pub mod soil;

#[derive(Subcommand)]
pub enum Command {
    /// Clean NDVI/NDMI series and derive farm statistics for uploaded parcels
    Analyze {
        /// Parcel CSV: uuid, region, area (acres), geometry (WKT)
        #[arg(short = 'p', long)]
        parcels: String,

        /// Long-form samples CSV: uuid, index, date, value
        #[arg(short = 's', long)]
        samples: String,

        /// Write the JSON report here instead of stdout
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Also store parcels and tables in this SQLite database
        #[arg(short = 'd', long)]
        database: Option<String>,

        /// First date of the fetch window
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Last date of the fetch window (defaults to today)
        #[arg(long)]
        end: Option<String>,

        /// Years of history before the end date
        #[arg(long, conflicts_with = "start")]
        lookback_years: Option<u32>,
    },

    /// Summarize stored statistics by region
    Regional {
        #[arg(short = 'd', long)]
        database: String,

        /// Only this region (all regions when omitted)
        #[arg(short = 'r', long)]
        region: Option<String>,

        /// Write the JSON summary here instead of stdout
        #[arg(short = 'o', long)]
        output: Option<String>,
    },

    /// Look up iSDA soil properties at each parcel's centroid
    Soil {
        #[arg(short = 'p', long)]
        parcels: String,

        /// Output path for the soil properties CSV
        #[arg(short = 'o', long)]
        output: String,

        #[arg(long, env = "ISDA_USERNAME")]
        username: String,

        #[arg(long, env = "ISDA_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = soil::ISDA_BASE_URL)]
        base_url: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Analyze {
            parcels,
            samples,
            output,
            database,
            start,
            end,
            lookback_years,
        } => {
            let range = analyze::resolve_window(start.as_deref(), end.as_deref(), lookback_years)?;
            analyze::run_analyze(&parcels, &samples, output.as_deref(), database.as_deref(), range).await
        }
        Command::Regional {
            database,
            region,
            output,
        } => regional::run_regional(&database, region.as_deref(), output.as_deref()).await,
        Command::Soil {
            parcels,
            output,
            username,
            password,
            base_url,
        } => soil::run_soil(&parcels, &output, &username, &password, &base_url).await,
    }
}
