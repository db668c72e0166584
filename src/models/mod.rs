pub mod anomaly;
pub mod baseline;
pub mod city;
pub mod correlation;
pub mod daily;
pub mod feature;
pub mod monthly;
pub mod run_summary;

pub use anomaly::{AnomalyRecord, EventRecord};
pub use baseline::ClimatologyBaseline;
pub use city::CityMetadata;
pub use correlation::{CityCorrelationSummary, LagCorrelation};
pub use daily::{DailyObservation, DailyObservationBuilder, DayFlags};
pub use feature::{FeatureVector, FEATURE_COLUMNS, TARGET_COLUMN};
pub use monthly::MonthlyAggregate;
pub use run_summary::{RunStatus, RunSummary};
