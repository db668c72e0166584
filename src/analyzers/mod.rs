pub mod anomaly_analyzer;

pub use anomaly_analyzer::{AnomalyAnalyzer, CityAnomalyStats, MonthExtreme, MonthRange};
