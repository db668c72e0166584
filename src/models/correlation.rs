use serde::{Deserialize, Serialize};

/// Pearson correlation between city A's anomaly at month t and city B's
/// anomaly at month t + lag. A positive lag means A leads B.
///
/// Both directions are stored: `(a, b, lag)` and `(b, a, -lag)` cover the
/// same aligned pairs and carry the same correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagCorrelation {
    pub city_id_a: u32,
    pub city_id_b: u32,
    pub lag_months: i32,
    pub n_observations: u32,
    /// `None` when too few months align or either side has zero variance
    pub correlation: Option<f64>,
}

impl LagCorrelation {
    pub fn mirrored(&self) -> Self {
        Self {
            city_id_a: self.city_id_b,
            city_id_b: self.city_id_a,
            lag_months: -self.lag_months,
            n_observations: self.n_observations,
            correlation: self.correlation,
        }
    }

    pub fn involves(&self, city_id: u32) -> bool {
        self.city_id_a == city_id || self.city_id_b == city_id
    }
}

/// Strongest lagged teleconnection for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCorrelationSummary {
    pub city_id: u32,
    pub partner_city_id: u32,
    /// |correlation| of the strongest pair/lag
    pub max_lagged_corr: f64,
    /// Signed correlation at that pair/lag
    pub correlation: f64,
    pub lead_lag_months: i32,
    pub n_observations: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored() {
        let corr = LagCorrelation {
            city_id_a: 1,
            city_id_b: 4,
            lag_months: 2,
            n_observations: 118,
            correlation: Some(0.41),
        };

        let mirror = corr.mirrored();
        assert_eq!(mirror.city_id_a, 4);
        assert_eq!(mirror.city_id_b, 1);
        assert_eq!(mirror.lag_months, -2);
        assert_eq!(mirror.correlation, Some(0.41));
        assert_eq!(mirror.mirrored(), corr);
        assert!(corr.involves(4));
        assert!(!corr.involves(2));
    }
}
