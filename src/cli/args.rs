use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "climate-anomaly")]
#[command(about = "Climatology baselines, anomalies, lag correlations and ML features from daily weather")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write every derived dataset
    Run {
        #[arg(short, long, help = "Daily observation CSV file, or directory of CSV files")]
        input: PathBuf,

        #[arg(long, help = "City registry CSV (city_id,city_name,country_code,...)")]
        cities: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output directory [default: output/climate-anomaly-{YYMMDD}]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(long, help = "Settings TOML file")]
        config: Option<PathBuf>,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, help = "First baseline year (inclusive)")]
        baseline_start: Option<i32>,

        #[arg(long, help = "Last baseline year (inclusive)")]
        baseline_end: Option<i32>,

        #[arg(long, help = "Largest lead/lag in months for city correlations")]
        max_lag: Option<i32>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,

        #[arg(long, default_value = "backfill", help = "Run mode recorded in the run summary")]
        mode: String,
    },

    /// Normalise and integrity-check observations without writing output
    Validate {
        #[arg(short, long, help = "Daily observation CSV file, or directory of CSV files")]
        input: PathBuf,

        #[arg(long, help = "City registry CSV")]
        cities: Option<PathBuf>,

        #[arg(long, help = "Settings TOML file")]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Display information about a Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, help = "Restrict anomaly statistics to one city")]
        city: Option<u32>,
    },
}
