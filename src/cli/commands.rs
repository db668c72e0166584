use crate::analyzers::AnomalyAnalyzer;
use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::models::DailyObservation;
use crate::processors::{ClimatePipeline, DailyNormalizer, IntegrityChecker};
use crate::readers::ConcurrentReader;
use crate::utils::constants::ANOMALY_DATASET;
use crate::utils::filename::generate_default_output_dir;
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::utils::settings::{BaselinePeriod, PipelineSettings};
use crate::writers::ParquetWriter;
use chrono::Utc;
use std::path::Path;
use tracing::{error, info};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            cities,
            output_dir,
            config,
            compression,
            baseline_start,
            baseline_end,
            max_lag,
            max_workers,
            mode,
        } => {
            let output_dir = output_dir.unwrap_or_else(generate_default_output_dir);
            let settings =
                load_settings(config.as_deref(), baseline_start, baseline_end, max_lag)?;
            // Fail on a bad codec before any work is done
            let writer = ParquetWriter::new().with_compression(&compression)?;

            println!("Running climate anomaly pipeline...");
            println!("Input: {}", input.display());
            println!("Output directory: {}", output_dir.display());
            println!(
                "Baseline: {}-{}, max lag: {} months, workers: {}",
                settings.baseline.start_year,
                settings.baseline.end_year,
                settings.correlation.max_lag_months,
                max_workers
            );

            let started_at = Utc::now();
            let progress = ProgressReporter::new_spinner("Reading inputs...", false);
            let reader = ConcurrentReader::new(max_workers);
            let data = reader.read_all(&input, cities.as_deref()).await?;

            let checker = IntegrityChecker::today();
            let integrity = checker.check_integrity(&data.observations);

            let pipeline = ClimatePipeline::new(settings).with_max_workers(max_workers);
            let result = pipeline.run(data.observations, Some(&progress));

            let summary = pipeline.summarize_run(&mode, started_at, result.as_ref());
            writer.write_run_summary(&summary, &output_dir)?;

            let output = match result {
                Ok(output) => output,
                Err(e) => {
                    error!(error = %e, "pipeline run failed");
                    return Err(e);
                }
            };

            println!("\n{}", checker.generate_summary(&integrity));

            let paths = writer.write_outputs(&output, &output_dir)?;
            for path in &paths {
                let file_info = writer.get_file_info(path)?;
                println!("{}: {} rows", path.display(), file_info.total_rows);
            }

            let analyzer = AnomalyAnalyzer::new();
            let stats = analyzer.city_statistics(&output.anomalies);
            println!("\n{}", analyzer.generate_report(&stats, &data.cities));

            info!(
                duration_seconds = summary.duration_seconds(),
                features = output.features.len(),
                "pipeline run complete"
            );
            println!("Processing complete!");
        }

        Commands::Validate {
            input,
            cities,
            config,
            max_workers,
        } => {
            println!("Validating daily observations...");
            println!("Input: {}", input.display());

            let progress = ProgressReporter::new_spinner("Reading observations...", false);
            let reader = ConcurrentReader::new(max_workers);
            let data = reader.read_all(&input, cities.as_deref()).await?;

            progress.set_message("Normalizing observations...");
            let daily = normalize_with_settings(data.observations, config.as_deref())?;
            progress.finish_with_message(&format!("Validated {} observations", daily.len()));

            let checker = IntegrityChecker::today();
            let report = checker.check_integrity(&daily);
            println!("\n{}", checker.generate_summary(&report));

            let gaps: usize = report.cities.values().map(|c| c.gaps.len()).sum();
            if gaps == 0 {
                println!("✅ All observations passed validation, no gaps");
            } else {
                println!("⚠️  Observations valid, {} date gaps found", gaps);
            }
        }

        Commands::Info { file, city } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if is_anomaly_dataset(&file) && file_info.total_rows > 0 {
                let analyzer = AnomalyAnalyzer::new();
                let records = analyzer.load_anomalies(&file)?;
                let filtered: Vec<_> = analyzer
                    .filter_anomalies(&records, city, None)
                    .into_iter()
                    .cloned()
                    .collect();
                let stats = analyzer.city_statistics(&filtered);
                println!("\n{}", analyzer.generate_report(&stats, &Default::default()));
            }
        }
    }

    Ok(())
}

/// File/env settings with command-line overrides applied on top
fn load_settings(
    config: Option<&Path>,
    baseline_start: Option<i32>,
    baseline_end: Option<i32>,
    max_lag: Option<i32>,
) -> Result<PipelineSettings> {
    let mut settings = PipelineSettings::load(config)?;

    if baseline_start.is_some() || baseline_end.is_some() {
        let baseline = BaselinePeriod::new(
            baseline_start.unwrap_or(settings.baseline.start_year),
            baseline_end.unwrap_or(settings.baseline.end_year),
        )?;
        settings = settings.with_baseline(baseline);
    }
    if let Some(max_lag) = max_lag {
        settings = settings.with_max_lag(max_lag);
    }

    settings.check()?;
    Ok(settings)
}

/// Normalize with the thresholds of the settings file (or env/defaults)
fn normalize_with_settings(
    observations: Vec<DailyObservation>,
    config: Option<&Path>,
) -> Result<Vec<DailyObservation>> {
    let settings = load_settings(config, None, None, None)?;
    DailyNormalizer::with_thresholds(settings.thresholds).normalize(observations)
}

fn is_anomaly_dataset(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s == ANOMALY_DATASET)
}
