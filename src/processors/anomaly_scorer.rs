use crate::error::{ProcessingError, Result};
use crate::models::{AnomalyRecord, ClimatologyBaseline, EventRecord, MonthlyAggregate};
use crate::processors::baseline_builder::check_monthly_keys;
use crate::utils::settings::Thresholds;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Scores monthly aggregates against their (city_id, month) baseline.
pub struct AnomalyScorer {
    thresholds: Thresholds,
}

impl AnomalyScorer {
    pub fn new() -> Self {
        Self {
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Join every monthly row to its baseline and compute anomalies,
    /// z-scores and threshold flags.
    ///
    /// Rows without a baseline for their (city_id, month) are dropped.
    pub fn score(
        &self,
        monthly: &[MonthlyAggregate],
        baselines: &[ClimatologyBaseline],
    ) -> Result<Vec<AnomalyRecord>> {
        check_monthly_keys(monthly, "monthly")?;
        let lookup = Self::index_baselines(baselines)?;

        let mut records: Vec<AnomalyRecord> = monthly
            .par_iter()
            .filter_map(|row| {
                lookup
                    .get(&(row.city_id, row.month))
                    .map(|baseline| self.score_row(row, baseline))
            })
            .collect();

        records.sort_by_key(|r| (r.city_id, r.year, r.month));

        debug!(
            monthly = monthly.len(),
            scored = records.len(),
            dropped = monthly.len() - records.len(),
            "scored monthly anomalies"
        );
        Ok(records)
    }

    fn index_baselines(
        baselines: &[ClimatologyBaseline],
    ) -> Result<HashMap<(u32, u32), &ClimatologyBaseline>> {
        let mut lookup = HashMap::with_capacity(baselines.len());
        for baseline in baselines {
            if lookup.insert(baseline.key(), baseline).is_some() {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Duplicate baseline for city {} month {}",
                    baseline.city_id, baseline.month
                )));
            }
        }
        Ok(lookup)
    }

    pub fn score_row(&self, row: &MonthlyAggregate, baseline: &ClimatologyBaseline) -> AnomalyRecord {
        let anomaly_tmean = difference(row.avg_tmean, baseline.mean_tmean);
        let anomaly_precip = difference(row.total_precip, baseline.mean_precip);

        let zscore_tmean = standardize(anomaly_tmean, baseline.usable_std_tmean());
        let zscore_precip = standardize(anomaly_precip, baseline.usable_std_precip());

        let t = &self.thresholds;
        AnomalyRecord {
            city_id: row.city_id,
            year: row.year,
            month: row.month,
            avg_tmean: row.avg_tmean,
            total_precip: row.total_precip,
            anomaly_tmean,
            anomaly_precip,
            zscore_tmean,
            zscore_precip,
            is_positive_temp_anomaly: anomaly_tmean.is_some_and(|a| a >= t.anomaly_temp_c),
            is_negative_temp_anomaly: anomaly_tmean.is_some_and(|a| a <= -t.anomaly_temp_c),
            is_strong_positive_temp_anomaly: zscore_tmean.is_some_and(|z| z >= t.strong_zscore),
            is_strong_negative_temp_anomaly: zscore_tmean.is_some_and(|z| z <= -t.strong_zscore),
        }
    }

    /// Z-score event classification of scored months
    pub fn classify_events(&self, anomalies: &[AnomalyRecord]) -> Vec<EventRecord> {
        anomalies.iter().map(|a| self.classify(a)).collect()
    }

    pub fn classify(&self, anomaly: &AnomalyRecord) -> EventRecord {
        let t = &self.thresholds;
        let z = anomaly.zscore_tmean;
        EventRecord {
            city_id: anomaly.city_id,
            year: anomaly.year,
            month: anomaly.month,
            zscore_tmean: z,
            is_hot_event: z.is_some_and(|z| z >= t.strong_zscore),
            is_cold_event: z.is_some_and(|z| z <= -t.strong_zscore),
            is_extreme_event: z.is_some_and(|z| z.abs() >= t.extreme_zscore),
        }
    }
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn difference(actual: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    Some(actual? - baseline?)
}

/// `std` must already be filtered to defined and strictly positive values
fn standardize(anomaly: Option<f64>, std: Option<f64>) -> Option<f64> {
    Some(anomaly? / std?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline(city_id: u32, month: u32, mean: f64, std: Option<f64>) -> ClimatologyBaseline {
        ClimatologyBaseline {
            city_id,
            month,
            n_years: 30,
            mean_tmean: Some(mean),
            mean_tmax: None,
            mean_tmin: None,
            mean_precip: Some(50.0),
            std_tmean: std,
            std_precip: Some(10.0),
        }
    }

    #[test]
    fn test_strong_positive_anomaly() {
        let scorer = AnomalyScorer::new();
        let monthly = vec![MonthlyAggregate::new(1, 2021, 7).with_tmean(19.0).with_precip(80.0)];
        let baselines = vec![baseline(1, 7, 15.0, Some(2.0))];

        let records = scorer.score(&monthly, &baselines).unwrap();
        let r = &records[0];
        assert_eq!(r.anomaly_tmean, Some(4.0));
        assert_eq!(r.zscore_tmean, Some(2.0));
        assert_eq!(r.anomaly_precip, Some(30.0));
        assert_eq!(r.zscore_precip, Some(3.0));
        assert!(r.is_positive_temp_anomaly);
        assert!(!r.is_negative_temp_anomaly);
        assert!(r.is_strong_positive_temp_anomaly);
        assert!(!r.is_strong_negative_temp_anomaly);

        let event = scorer.classify(r);
        assert!(event.is_hot_event);
        assert!(!event.is_cold_event);
        assert!(!event.is_extreme_event);
    }

    #[test]
    fn test_zero_std_leaves_zscore_undefined() {
        let scorer = AnomalyScorer::new();
        let monthly = vec![MonthlyAggregate::new(1, 2021, 7).with_tmean(12.0)];

        for std in [Some(0.0), None] {
            let records = scorer.score(&monthly, &[baseline(1, 7, 15.0, std)]).unwrap();
            let r = &records[0];
            assert_eq!(r.anomaly_tmean, Some(-3.0));
            assert_eq!(r.zscore_tmean, None);
            assert!(r.is_negative_temp_anomaly);
            assert!(!r.is_strong_negative_temp_anomaly);
            assert!(!scorer.classify(r).is_cold_event);
        }
    }

    #[test]
    fn test_rows_without_baseline_are_dropped() {
        let scorer = AnomalyScorer::new();
        let monthly = vec![
            MonthlyAggregate::new(1, 2021, 7).with_tmean(15.0),
            MonthlyAggregate::new(1, 2021, 8).with_tmean(15.0),
            MonthlyAggregate::new(2, 2021, 7).with_tmean(15.0),
        ];
        let records = scorer
            .score(&monthly, &[baseline(1, 7, 15.0, Some(1.0))])
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!((records[0].city_id, records[0].month), (1, 7));
    }

    #[test]
    fn test_extreme_cold_event() {
        let scorer = AnomalyScorer::new();
        let monthly = vec![MonthlyAggregate::new(1, 2012, 2).with_tmean(4.0)];
        let records = scorer
            .score(&monthly, &[baseline(1, 2, 10.0, Some(2.0))])
            .unwrap();

        let event = scorer.classify(&records[0]);
        assert_eq!(event.zscore_tmean, Some(-3.0));
        assert!(event.is_cold_event);
        assert!(event.is_extreme_event);
        assert!(records[0].is_strong_negative_temp_anomaly);
    }

    #[test]
    fn test_missing_actual_gives_undefined_anomaly() {
        let scorer = AnomalyScorer::new();
        let monthly = vec![MonthlyAggregate::new(1, 2012, 2)];
        let records = scorer
            .score(&monthly, &[baseline(1, 2, 10.0, Some(2.0))])
            .unwrap();

        assert_eq!(records[0].anomaly_tmean, None);
        assert_eq!(records[0].zscore_tmean, None);
        assert!(!records[0].is_positive_temp_anomaly);
    }
}
