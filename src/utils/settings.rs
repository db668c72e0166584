use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Inclusive year range the climatology is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BaselinePeriod {
    #[validate(range(min = 1800, max = 2200))]
    pub start_year: i32,

    #[validate(range(min = 1800, max = 2200))]
    pub end_year: i32,
}

impl BaselinePeriod {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self> {
        let period = Self {
            start_year,
            end_year,
        };
        period.check()?;
        Ok(period)
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    pub fn check(&self) -> Result<()> {
        if self.start_year > self.end_year {
            return Err(ProcessingError::InvalidBaselinePeriod {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        self.validate()?;
        Ok(())
    }
}

impl Default for BaselinePeriod {
    fn default() -> Self {
        Self {
            start_year: BASELINE_START_YEAR,
            end_year: BASELINE_END_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Thresholds {
    pub heat_day_tmax: f64,
    pub tropical_night_tmin: f64,

    #[validate(range(min = 0.0))]
    pub heavy_precip_mm: f64,

    pub summer_day_tmax: f64,

    #[validate(range(min = 0.0))]
    pub anomaly_temp_c: f64,

    #[validate(range(min = 0.0))]
    pub strong_zscore: f64,

    #[validate(range(min = 0.0))]
    pub extreme_zscore: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heat_day_tmax: HEAT_DAY_TMAX_C,
            tropical_night_tmin: TROPICAL_NIGHT_TMIN_C,
            heavy_precip_mm: HEAVY_PRECIP_MM,
            summer_day_tmax: SUMMER_DAY_TMAX_C,
            anomaly_temp_c: ANOMALY_TEMP_THRESHOLD_C,
            strong_zscore: STRONG_ZSCORE_THRESHOLD,
            extreme_zscore: EXTREME_ZSCORE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CorrelationSettings {
    #[validate(range(min = 0, max = 120))]
    pub max_lag_months: i32,

    #[validate(range(min = 2))]
    pub min_overlap: usize,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            max_lag_months: MAX_LAG_MONTHS,
            min_overlap: MIN_CORRELATION_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FeatureSettings {
    #[validate(range(min = 1))]
    pub min_history_months: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            min_history_months: MIN_HISTORY_MONTHS,
        }
    }
}

/// Everything the pipeline stages can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineSettings {
    #[validate(nested)]
    pub baseline: BaselinePeriod,

    #[validate(nested)]
    pub thresholds: Thresholds,

    #[validate(nested)]
    pub correlation: CorrelationSettings,

    #[validate(nested)]
    pub features: FeatureSettings,
}

impl PipelineSettings {
    /// Load settings from an optional TOML file, then `CLIMATE_*` environment
    /// variables (`CLIMATE_BASELINE__START_YEAR=1991`), over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let settings: PipelineSettings = builder
            .add_source(
                config::Environment::with_prefix(SETTINGS_ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.check()?;
        Ok(settings)
    }

    pub fn check(&self) -> Result<()> {
        self.baseline.check()?;
        if self.thresholds.extreme_zscore < self.thresholds.strong_zscore {
            return Err(ProcessingError::Config(format!(
                "extreme_zscore ({}) must not be below strong_zscore ({})",
                self.thresholds.extreme_zscore, self.thresholds.strong_zscore
            )));
        }
        self.validate()?;
        Ok(())
    }

    pub fn with_baseline(mut self, baseline: BaselinePeriod) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_max_lag(mut self, max_lag_months: i32) -> Self {
        self.correlation.max_lag_months = max_lag_months;
        self
    }
}
