//! FVI CLI - farmland vegetation index analytics from the command line.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "fvi-cli",
    version,
    about = "Farmland NDVI/NDMI cleaning, peak analysis and soil lookup"
)]
struct Cli {
    #[command(subcommand)]
    command: fvi_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    fvi_cmd::run(cli.command).await
}
