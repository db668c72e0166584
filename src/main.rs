use clap::Parser;
use climate_anomaly::cli::{run, Cli};
use climate_anomaly::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
