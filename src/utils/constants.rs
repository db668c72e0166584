/// Daily threshold defaults (°C / mm)
pub const HEAT_DAY_TMAX_C: f64 = 30.0;
pub const TROPICAL_NIGHT_TMIN_C: f64 = 20.0;
pub const HEAVY_PRECIP_MM: f64 = 10.0;
pub const SUMMER_DAY_TMAX_C: f64 = 25.0;

/// Tolerance for tmin <= tmean <= tmax checks on real-world data
pub const TEMP_RELATIONSHIP_TOLERANCE: f64 = 1.0;

/// Baseline period defaults (inclusive WMO normal 1981-2010)
pub const BASELINE_START_YEAR: i32 = 1981;
pub const BASELINE_END_YEAR: i32 = 2010;

/// Anomaly thresholds
pub const ANOMALY_TEMP_THRESHOLD_C: f64 = 1.0;
pub const STRONG_ZSCORE_THRESHOLD: f64 = 2.0;
pub const EXTREME_ZSCORE_THRESHOLD: f64 = 3.0;

/// Cross-city correlation defaults
pub const MAX_LAG_MONTHS: i32 = 6;
pub const MIN_CORRELATION_OVERLAP: usize = 2;

/// Feature window sizes
pub const SHORT_WINDOW_MONTHS: usize = 3;
pub const LONG_WINDOW_MONTHS: usize = 6;
pub const MIN_HISTORY_MONTHS: usize = 6;

/// Ingestion freshness bounds (days behind the reference date)
pub const FRESH_MAX_LAG_DAYS: i64 = 1;
pub const STALE_MAX_LAG_DAYS: i64 = 7;

/// Parquet defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Environment variable prefix for settings overrides
pub const SETTINGS_ENV_PREFIX: &str = "CLIMATE";

/// Output dataset file stems
pub const MONTHLY_DATASET: &str = "monthly_climate";
pub const BASELINE_DATASET: &str = "climatology_baseline";
pub const ANOMALY_DATASET: &str = "anomaly_city_month";
pub const EVENT_DATASET: &str = "anomaly_city_events";
pub const CORRELATION_DATASET: &str = "anomaly_city_correlations";
pub const FEATURE_DATASET: &str = "ml_features";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
