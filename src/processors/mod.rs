pub mod anomaly_scorer;
pub mod baseline_builder;
pub mod daily_normalizer;
pub mod feature_builder;
pub mod integrity_checker;
pub mod lag_correlator;
pub mod monthly_aggregator;
pub mod pipeline;

pub use anomaly_scorer::AnomalyScorer;
pub use baseline_builder::BaselineBuilder;
pub use daily_normalizer::DailyNormalizer;
pub use feature_builder::FeatureBuilder;
pub use integrity_checker::{CityCoverage, DateGap, Freshness, IntegrityChecker, IntegrityReport};
pub use lag_correlator::LagCorrelator;
pub use monthly_aggregator::MonthlyAggregator;
pub use pipeline::{ClimatePipeline, PipelineOutput};
