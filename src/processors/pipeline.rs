use crate::error::{ProcessingError, Result};
use crate::models::{
    AnomalyRecord, CityCorrelationSummary, ClimatologyBaseline, DailyObservation, EventRecord,
    FeatureVector, LagCorrelation, MonthlyAggregate, RunStatus, RunSummary,
};
use crate::processors::{
    AnomalyScorer, BaselineBuilder, DailyNormalizer, FeatureBuilder, LagCorrelator,
    MonthlyAggregator,
};
use crate::readers::ConcurrentReader;
use crate::utils::constants::*;
use crate::utils::progress::ProgressReporter;
use crate::utils::settings::PipelineSettings;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::info;

const STAGE_COUNT: usize = 6;

/// Every dataset a full run derives, each regenerated from scratch.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub daily: Vec<DailyObservation>,
    pub monthly: Vec<MonthlyAggregate>,
    pub baselines: Vec<ClimatologyBaseline>,
    pub anomalies: Vec<AnomalyRecord>,
    pub events: Vec<EventRecord>,
    pub correlations: Vec<LagCorrelation>,
    pub correlation_summary: BTreeMap<u32, CityCorrelationSummary>,
    pub features: Vec<FeatureVector>,
}

impl PipelineOutput {
    pub fn row_counts(&self) -> BTreeMap<String, usize> {
        [
            ("daily_observations", self.daily.len()),
            (MONTHLY_DATASET, self.monthly.len()),
            (BASELINE_DATASET, self.baselines.len()),
            (ANOMALY_DATASET, self.anomalies.len()),
            (EVENT_DATASET, self.events.len()),
            (CORRELATION_DATASET, self.correlations.len()),
            (FEATURE_DATASET, self.features.len()),
        ]
        .into_iter()
        .map(|(name, rows)| (name.to_string(), rows))
        .collect()
    }
}

/// Runs the stages strictly downstream on a dedicated rayon pool:
/// normalize → aggregate → baseline → score → correlate → features.
pub struct ClimatePipeline {
    settings: PipelineSettings,
    max_workers: usize,
}

impl ClimatePipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            max_workers: num_cpus::get(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Read observations from a CSV file or directory, then run all stages
    pub async fn run_from_path(
        &self,
        input: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        if let Some(p) = progress {
            p.set_message("Reading daily observations...");
        }

        let reader = ConcurrentReader::new(self.max_workers);
        let observations = reader.read_observations(input).await?;
        info!(rows = observations.len(), input = %input.display(), "loaded daily observations");

        self.run(observations, progress)
    }

    pub fn run(
        &self,
        observations: Vec<DailyObservation>,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        self.settings.check()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        pool.install(|| self.run_stages(observations, progress))
    }

    fn run_stages(
        &self,
        observations: Vec<DailyObservation>,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        let settings = &self.settings;
        let stage = |index: usize, message: &str| {
            if let Some(p) = progress {
                p.stage(index, STAGE_COUNT, message);
            }
        };

        stage(1, "Normalizing daily observations");
        let started = Instant::now();
        let daily = DailyNormalizer::with_thresholds(settings.thresholds.clone())
            .normalize(observations)?;
        info!(rows = daily.len(), elapsed_ms = started.elapsed().as_millis() as u64, "daily normalizer");

        stage(2, "Aggregating monthly climate");
        let started = Instant::now();
        let monthly = MonthlyAggregator::with_thresholds(settings.thresholds.clone()).aggregate(&daily)?;
        info!(rows = monthly.len(), elapsed_ms = started.elapsed().as_millis() as u64, "monthly aggregator");

        stage(3, "Building climatology baselines");
        let started = Instant::now();
        let baselines = BaselineBuilder::new(settings.baseline).build(&monthly)?;
        info!(rows = baselines.len(), elapsed_ms = started.elapsed().as_millis() as u64, "baseline builder");

        stage(4, "Scoring anomalies");
        let started = Instant::now();
        let scorer = AnomalyScorer::with_thresholds(settings.thresholds.clone());
        let anomalies = scorer.score(&monthly, &baselines)?;
        let events = scorer.classify_events(&anomalies);
        info!(
            rows = anomalies.len(),
            events = events.iter().filter(|e| e.is_event()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "anomaly scorer"
        );

        stage(5, "Correlating cities across lags");
        let started = Instant::now();
        let correlations =
            LagCorrelator::with_settings(settings.correlation.clone()).correlate(&anomalies)?;
        let correlation_summary = LagCorrelator::summarize(&correlations);
        info!(
            rows = correlations.len(),
            summarized_cities = correlation_summary.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "lag correlator"
        );

        stage(6, "Building feature vectors");
        let started = Instant::now();
        let features = FeatureBuilder::with_settings(settings.features.clone())
            .build(&anomalies, &correlation_summary)?;
        info!(rows = features.len(), elapsed_ms = started.elapsed().as_millis() as u64, "feature builder");

        if let Some(p) = progress {
            p.finish_with_message(&format!("Built {} feature vectors", features.len()));
        }

        Ok(PipelineOutput {
            daily,
            monthly,
            baselines,
            anomalies,
            events,
            correlations,
            correlation_summary,
            features,
        })
    }

    /// Run metadata for a finished (or failed) run
    pub fn summarize_run(
        &self,
        run_mode: &str,
        started_at: chrono::DateTime<Utc>,
        outcome: std::result::Result<&PipelineOutput, &ProcessingError>,
    ) -> RunSummary {
        let (status, rows, error) = match outcome {
            Ok(output) => (RunStatus::Success, output.row_counts(), None),
            Err(e) => (RunStatus::Failed, BTreeMap::new(), Some(e.to_string())),
        };

        RunSummary {
            flow_name: "climate_anomaly_pipeline".to_string(),
            run_mode: run_mode.to_string(),
            status,
            started_at,
            finished_at: Utc::now(),
            baseline_start_year: self.settings.baseline.start_year,
            baseline_end_year: self.settings.baseline.end_year,
            rows,
            error,
        }
    }
}

impl Default for ClimatePipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}
