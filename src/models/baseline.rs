use serde::{Deserialize, Serialize};

/// Long-run climatology for one city and calendar month.
///
/// Standard deviations are sample (n - 1) deviations and are `None` when
/// fewer than two baseline years contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimatologyBaseline {
    pub city_id: u32,
    pub month: u32,

    /// Baseline years with a monthly row for this key
    pub n_years: u32,

    pub mean_tmean: Option<f64>,
    pub mean_tmax: Option<f64>,
    pub mean_tmin: Option<f64>,
    pub mean_precip: Option<f64>,
    pub std_tmean: Option<f64>,
    pub std_precip: Option<f64>,
}

impl ClimatologyBaseline {
    pub fn key(&self) -> (u32, u32) {
        (self.city_id, self.month)
    }

    /// Standard deviation usable as a z-score denominator
    pub fn usable_std_tmean(&self) -> Option<f64> {
        usable_std(self.std_tmean)
    }

    pub fn usable_std_precip(&self) -> Option<f64> {
        usable_std(self.std_precip)
    }
}

fn usable_std(std: Option<f64>) -> Option<f64> {
    std.filter(|s| s.is_finite() && *s > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline(std_tmean: Option<f64>) -> ClimatologyBaseline {
        ClimatologyBaseline {
            city_id: 1,
            month: 6,
            n_years: 30,
            mean_tmean: Some(21.0),
            mean_tmax: None,
            mean_tmin: None,
            mean_precip: Some(12.0),
            std_tmean,
            std_precip: Some(4.0),
        }
    }

    #[test]
    fn test_usable_std() {
        assert_eq!(baseline(Some(1.5)).usable_std_tmean(), Some(1.5));
        assert_eq!(baseline(Some(0.0)).usable_std_tmean(), None);
        assert_eq!(baseline(None).usable_std_tmean(), None);
        assert_eq!(baseline(None).usable_std_precip(), Some(4.0));
    }
}
