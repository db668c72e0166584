pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;
pub mod settings;
pub mod stats;

pub use constants::*;
pub use filename::{dataset_path, generate_default_output_dir};
pub use logging::init_logging;
pub use progress::ProgressReporter;
pub use settings::{BaselinePeriod, CorrelationSettings, FeatureSettings, PipelineSettings, Thresholds};
pub use stats::{from_time_index, mean, pearson, sample_std, time_index};
