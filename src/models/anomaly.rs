use serde::{Deserialize, Serialize};

use crate::utils::stats::time_index;

/// A monthly aggregate scored against its climatology baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub city_id: u32,
    pub year: i32,
    pub month: u32,

    pub avg_tmean: Option<f64>,
    pub total_precip: Option<f64>,

    /// actual - baseline mean
    pub anomaly_tmean: Option<f64>,
    pub anomaly_precip: Option<f64>,

    /// anomaly / baseline std, only when the std is defined and positive
    pub zscore_tmean: Option<f64>,
    pub zscore_precip: Option<f64>,

    pub is_positive_temp_anomaly: bool,
    pub is_negative_temp_anomaly: bool,
    pub is_strong_positive_temp_anomaly: bool,
    pub is_strong_negative_temp_anomaly: bool,
}

impl AnomalyRecord {
    pub fn time_index(&self) -> i32 {
        time_index(self.year, self.month)
    }

    pub fn is_strong_temp_anomaly(&self) -> bool {
        self.is_strong_positive_temp_anomaly || self.is_strong_negative_temp_anomaly
    }
}

/// Z-score based event classification of an anomaly month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub city_id: u32,
    pub year: i32,
    pub month: u32,
    pub zscore_tmean: Option<f64>,
    pub is_hot_event: bool,
    pub is_cold_event: bool,
    pub is_extreme_event: bool,
}

impl EventRecord {
    pub fn is_event(&self) -> bool {
        self.is_hot_event || self.is_cold_event
    }
}
