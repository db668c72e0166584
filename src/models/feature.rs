use serde::{Deserialize, Serialize};

/// Feature columns in the order a model consumes them
pub const FEATURE_COLUMNS: [&str; 11] = [
    "anomaly_tmean",
    "roll_mean_3",
    "roll_mean_6",
    "roll_std_3",
    "roll_std_6",
    "delta_1m",
    "delta_3m",
    "max_lagged_corr",
    "lead_lag_months",
    "sin_month",
    "cos_month",
];

pub const TARGET_COLUMN: &str = "is_event_next_month";

/// Supervised-learning row for one city-month.
///
/// Only months with a complete 6-month trailing window are emitted, so
/// `roll_mean_6` is always present. `max_lagged_corr` and
/// `lead_lag_months` are `None` for a city with no correlation partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub city_id: u32,
    pub year: i32,
    pub month: u32,

    pub sin_month: f64,
    pub cos_month: f64,

    pub anomaly_tmean: f64,
    pub roll_mean_3: Option<f64>,
    pub roll_mean_6: f64,
    pub roll_std_3: Option<f64>,
    pub roll_std_6: Option<f64>,
    pub delta_1m: Option<f64>,
    pub delta_3m: Option<f64>,

    pub max_lagged_corr: Option<f64>,
    pub lead_lag_months: Option<i32>,

    /// 1 when the next calendar month is a strong anomaly. A missing next
    /// month also yields 0, indistinguishable from a true negative.
    pub is_event_next_month: u8,

    /// Whether the next calendar month exists for this city; lets a consumer
    /// drop the unlabelled tail that `is_event_next_month` cannot express.
    pub has_next_month: bool,
}

impl FeatureVector {
    /// Feature values aligned with [`FEATURE_COLUMNS`]
    pub fn feature_values(&self) -> [Option<f64>; 11] {
        [
            Some(self.anomaly_tmean),
            self.roll_mean_3,
            Some(self.roll_mean_6),
            self.roll_std_3,
            self.roll_std_6,
            self.delta_1m,
            self.delta_3m,
            self.max_lagged_corr,
            self.lead_lag_months.map(f64::from),
            Some(self.sin_month),
            Some(self.cos_month),
        ]
    }

    /// Seasonal encoding of a calendar month on the unit circle
    pub fn seasonal_encoding(month: u32) -> (f64, f64) {
        let angle = 2.0 * std::f64::consts::PI * month as f64 / 12.0;
        (angle.sin(), angle.cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seasonal_encoding() {
        let (sin_dec, cos_dec) = FeatureVector::seasonal_encoding(12);
        assert!(sin_dec.abs() < 1e-12);
        assert!((cos_dec - 1.0).abs() < 1e-12);

        let (sin_mar, cos_mar) = FeatureVector::seasonal_encoding(3);
        assert!((sin_mar - 1.0).abs() < 1e-12);
        assert!(cos_mar.abs() < 1e-12);
    }

    #[test]
    fn test_feature_values_align_with_columns() {
        let row = FeatureVector {
            city_id: 1,
            year: 2001,
            month: 6,
            sin_month: 0.0,
            cos_month: -1.0,
            anomaly_tmean: 1.2,
            roll_mean_3: Some(0.9),
            roll_mean_6: 0.5,
            roll_std_3: Some(0.3),
            roll_std_6: Some(0.6),
            delta_1m: Some(0.4),
            delta_3m: Some(-0.2),
            max_lagged_corr: None,
            lead_lag_months: Some(-2),
            is_event_next_month: 0,
            has_next_month: true,
        };

        let values = row.feature_values();
        assert_eq!(values.len(), FEATURE_COLUMNS.len());
        assert_eq!(values[0], Some(1.2));
        assert_eq!(values[2], Some(0.5));
        assert_eq!(values[7], None);
        assert_eq!(values[8], Some(-2.0));
    }
}
