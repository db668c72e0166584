use crate::error::{ProcessingError, Result};
use crate::models::{AnomalyRecord, CityCorrelationSummary, LagCorrelation};
use crate::utils::settings::CorrelationSettings;
use crate::utils::stats::pearson;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Anomaly series of one city keyed by time index
type Series = BTreeMap<i32, f64>;

/// Pairwise, lag-offset Pearson correlation of city anomaly series.
pub struct LagCorrelator {
    settings: CorrelationSettings,
}

impl LagCorrelator {
    pub fn new() -> Self {
        Self {
            settings: CorrelationSettings::default(),
        }
    }

    pub fn with_settings(settings: CorrelationSettings) -> Self {
        Self { settings }
    }

    /// Correlate every ordered pair of distinct cities over
    /// `-max_lag..=max_lag`, pairing A at month t with B at t + lag.
    ///
    /// Each unordered pair is computed once and emitted in both directions,
    /// so `(a, b, lag)` and `(b, a, -lag)` are always numerically equal.
    pub fn correlate(&self, anomalies: &[AnomalyRecord]) -> Result<Vec<LagCorrelation>> {
        if self.settings.max_lag_months < 0 {
            return Err(ProcessingError::Config(format!(
                "max_lag_months must be non-negative, got {}",
                self.settings.max_lag_months
            )));
        }

        let series = Self::index_series(anomalies)?;
        let cities: Vec<u32> = series.keys().copied().collect();

        let pairs: Vec<(u32, u32)> = cities
            .iter()
            .enumerate()
            .flat_map(|(i, &a)| cities[i + 1..].iter().map(move |&b| (a, b)))
            .collect();

        let max_lag = self.settings.max_lag_months;
        let mut correlations: Vec<LagCorrelation> = pairs
            .par_iter()
            .flat_map_iter(|&(a, b)| {
                let (series_a, series_b) = (&series[&a], &series[&b]);
                (-max_lag..=max_lag).flat_map(move |lag| {
                    let forward = self.correlate_pair(a, series_a, b, series_b, lag);
                    let mirror = forward.mirrored();
                    [forward, mirror]
                })
            })
            .collect();

        correlations.sort_by_key(|c| (c.city_id_a, c.city_id_b, c.lag_months));

        debug!(
            cities = cities.len(),
            rows = correlations.len(),
            defined = correlations.iter().filter(|c| c.correlation.is_some()).count(),
            "computed lagged cross-city correlations"
        );
        Ok(correlations)
    }

    fn index_series(anomalies: &[AnomalyRecord]) -> Result<BTreeMap<u32, Series>> {
        let mut series: BTreeMap<u32, Series> = BTreeMap::new();
        for record in anomalies {
            let Some(value) = record.anomaly_tmean else {
                continue;
            };
            if series
                .entry(record.city_id)
                .or_default()
                .insert(record.time_index(), value)
                .is_some()
            {
                return Err(ProcessingError::DuplicatePeriod {
                    dataset: "anomaly",
                    city_id: record.city_id,
                    year: record.year,
                    month: record.month,
                });
            }
        }
        Ok(series)
    }

    fn correlate_pair(
        &self,
        city_a: u32,
        series_a: &Series,
        city_b: u32,
        series_b: &Series,
        lag: i32,
    ) -> LagCorrelation {
        let aligned: Vec<(f64, f64)> = series_a
            .iter()
            .filter_map(|(&t, &va)| series_b.get(&(t + lag)).map(|&vb| (va, vb)))
            .collect();

        let correlation = if aligned.len() >= self.settings.min_overlap {
            pearson(&aligned)
        } else {
            None
        };

        LagCorrelation {
            city_id_a: city_a,
            city_id_b: city_b,
            lag_months: lag,
            n_observations: aligned.len() as u32,
            correlation,
        }
    }

    /// Strongest defined correlation per city (as `city_id_a`). Non-finite
    /// values never take part.
    ///
    /// Ties on |correlation| go to the smallest |lag|, then the lowest
    /// partner id, then the negative lag.
    pub fn summarize(correlations: &[LagCorrelation]) -> BTreeMap<u32, CityCorrelationSummary> {
        let mut best: BTreeMap<u32, &LagCorrelation> = BTreeMap::new();

        let defined = correlations
            .iter()
            .filter(|c| c.correlation.is_some_and(f64::is_finite));
        for candidate in defined {
            best.entry(candidate.city_id_a)
                .and_modify(|current| {
                    if Self::rank(candidate, current) == Ordering::Less {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }

        best.into_iter()
            .filter_map(|(city_id, c)| {
                let correlation = c.correlation?;
                Some((
                    city_id,
                    CityCorrelationSummary {
                        city_id,
                        partner_city_id: c.city_id_b,
                        max_lagged_corr: correlation.abs(),
                        correlation,
                        lead_lag_months: c.lag_months,
                        n_observations: c.n_observations,
                    },
                ))
            })
            .collect()
    }

    /// `Less` means `a` ranks ahead of `b`
    fn rank(a: &LagCorrelation, b: &LagCorrelation) -> Ordering {
        let abs_a = a.correlation.map_or(0.0, f64::abs);
        let abs_b = b.correlation.map_or(0.0, f64::abs);
        abs_b
            .total_cmp(&abs_a)
            .then_with(|| a.lag_months.abs().cmp(&b.lag_months.abs()))
            .then_with(|| a.city_id_b.cmp(&b.city_id_b))
            .then_with(|| a.lag_months.cmp(&b.lag_months))
    }
}

impl Default for LagCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::stats::from_time_index;

    fn series(city_id: u32, start: i32, values: &[f64]) -> Vec<AnomalyRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let (year, month) = from_time_index(start + i as i32);
                AnomalyRecord {
                    city_id,
                    year,
                    month,
                    avg_tmean: None,
                    total_precip: None,
                    anomaly_tmean: Some(v),
                    anomaly_precip: None,
                    zscore_tmean: None,
                    zscore_precip: None,
                    is_positive_temp_anomaly: false,
                    is_negative_temp_anomaly: false,
                    is_strong_positive_temp_anomaly: false,
                    is_strong_negative_temp_anomaly: false,
                }
            })
            .collect()
    }

    fn corr(a: u32, b: u32, lag: i32, value: Option<f64>) -> LagCorrelation {
        LagCorrelation {
            city_id_a: a,
            city_id_b: b,
            lag_months: lag,
            n_observations: 10,
            correlation: value,
        }
    }

    fn find(rows: &[LagCorrelation], a: u32, b: u32, lag: i32) -> &LagCorrelation {
        rows.iter()
            .find(|c| c.city_id_a == a && c.city_id_b == b && c.lag_months == lag)
            .unwrap()
    }

    #[test]
    fn test_output_shape() {
        let values = [0.1, -0.4, 0.9, 0.3, -1.2, 0.5, 0.0, 0.7];
        let mut anomalies = series(1, 24_001, &values);
        anomalies.extend(series(2, 24_001, &values));
        anomalies.extend(series(3, 24_001, &values));

        let rows = LagCorrelator::new().correlate(&anomalies).unwrap();
        // 3 cities -> 6 ordered pairs, 13 lags each
        assert_eq!(rows.len(), 6 * 13);
        assert!(rows.iter().all(|c| c.city_id_a != c.city_id_b));
    }

    #[test]
    fn test_mirror_symmetry() {
        let a = [0.3, -0.2, 1.1, 0.4, -0.8, 0.6, 0.2, -0.1, 0.9, -0.5];
        let b = [-0.1, 0.5, 0.2, 0.8, -0.3, -0.6, 1.0, 0.1, -0.2, 0.4];
        let mut anomalies = series(1, 24_001, &a);
        anomalies.extend(series(2, 24_003, &b));

        let rows = LagCorrelator::new().correlate(&anomalies).unwrap();
        for lag in -6..=6 {
            let forward = find(&rows, 1, 2, lag);
            let backward = find(&rows, 2, 1, -lag);
            assert_eq!(forward.n_observations, backward.n_observations);
            assert_eq!(forward.correlation, backward.correlation);
        }
    }

    #[test]
    fn test_peak_at_known_offset() {
        let a = [0.5, -1.0, 2.0, 0.3, -0.7, 1.4, -0.2, 0.9, -1.5, 0.6, 0.1, -0.4];
        let mut anomalies = series(1, 24_001, &a);
        // City 2 repeats city 1 one month later
        anomalies.extend(series(2, 24_002, &a));

        let rows = LagCorrelator::new().correlate(&anomalies).unwrap();
        let at_plus_one = find(&rows, 1, 2, 1).correlation.unwrap();
        assert!((at_plus_one - 1.0).abs() < 1e-12);
        assert!((find(&rows, 2, 1, -1).correlation.unwrap() - 1.0).abs() < 1e-12);

        let at_zero = find(&rows, 1, 2, 0).correlation.unwrap();
        assert!(at_zero.abs() < at_plus_one.abs());
    }

    #[test]
    fn test_insufficient_overlap_is_undefined() {
        let mut anomalies = series(1, 24_001, &[1.0, 2.0]);
        anomalies.extend(series(2, 24_002, &[3.0, 1.0]));

        let rows = LagCorrelator::new().correlate(&anomalies).unwrap();
        let one_overlap = find(&rows, 1, 2, 0);
        assert_eq!(one_overlap.n_observations, 1);
        assert_eq!(one_overlap.correlation, None);

        let none_overlap = find(&rows, 1, 2, 5);
        assert_eq!(none_overlap.n_observations, 0);
        assert_eq!(none_overlap.correlation, None);
    }

    #[test]
    fn test_summary_tie_breaks() {
        let rows = vec![
            corr(1, 3, 2, Some(0.8)),
            corr(1, 2, -2, Some(-0.8)),
            corr(1, 2, 2, Some(0.8)),
            corr(1, 4, 0, Some(0.5)),
            corr(1, 5, 1, None),
            corr(2, 1, 3, Some(0.2)),
        ];

        let summary = LagCorrelator::summarize(&rows);
        let city1 = &summary[&1];
        assert_eq!(city1.partner_city_id, 2);
        assert_eq!(city1.lead_lag_months, -2);
        assert_eq!(city1.max_lagged_corr, 0.8);
        assert_eq!(city1.correlation, -0.8);

        assert_eq!(summary[&2].lead_lag_months, 3);
        assert!(!summary.contains_key(&5));
    }

    #[test]
    fn test_summary_prefers_smaller_lag() {
        let rows = vec![corr(1, 2, 4, Some(0.6)), corr(1, 2, -1, Some(-0.6))];
        assert_eq!(LagCorrelator::summarize(&rows)[&1].lead_lag_months, -1);
    }

    #[test]
    fn test_single_city_has_no_pairs() {
        let anomalies = series(1, 24_001, &[1.0, 2.0, 3.0]);
        let rows = LagCorrelator::new().correlate(&anomalies).unwrap();
        assert!(rows.is_empty());
        assert!(LagCorrelator::summarize(&rows).is_empty());
    }

    #[test]
    fn test_summary_skips_non_finite_correlations() {
        let rows = vec![
            corr(1, 2, 1, Some(0.4)),
            corr(1, 3, 0, Some(f64::NAN)),
            corr(1, 3, 2, Some(f64::INFINITY)),
            corr(4, 1, 0, Some(f64::NAN)),
        ];

        let summary = LagCorrelator::summarize(&rows);
        assert_eq!(summary[&1].partner_city_id, 2);
        assert_eq!(summary[&1].lead_lag_months, 1);
        assert!((summary[&1].max_lagged_corr - 0.4).abs() < 1e-12);
        assert!(!summary.contains_key(&4));
    }
}
