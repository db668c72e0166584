use crate::error::{ProcessingError, Result};
use crate::models::{AnomalyRecord, CityCorrelationSummary, FeatureVector};
use crate::utils::constants::{LONG_WINDOW_MONTHS, SHORT_WINDOW_MONTHS};
use crate::utils::settings::FeatureSettings;
use crate::utils::stats::{mean, sample_std};
use rayon::prelude::*;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Calendar-aligned trailing window over one city's monthly series.
///
/// Holds the values whose time index lies in `t - size + 1 ..= t` for the
/// most recently pushed `t`; pushes must arrive in ascending time order.
struct TrailingWindow {
    size: usize,
    entries: VecDeque<(i32, f64)>,
}

impl TrailingWindow {
    fn new(size: usize) -> Self {
        Self {
            size,
            entries: VecDeque::with_capacity(size),
        }
    }

    fn push(&mut self, time_index: i32, value: f64) {
        let oldest = time_index - self.size as i32 + 1;
        while self.entries.front().is_some_and(|&(t, _)| t < oldest) {
            self.entries.pop_front();
        }
        self.entries.push_back((time_index, value));
    }

    fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|&(_, v)| v).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_full(&self) -> bool {
        self.entries.len() == self.size
    }
}

/// Rolling statistics of one window; `None` where the window is too sparse
struct WindowStats {
    mean: Option<f64>,
    std: Option<f64>,
}

impl WindowStats {
    fn of(window: &TrailingWindow, min_periods: usize) -> Self {
        if window.len() < min_periods {
            return Self {
                mean: None,
                std: None,
            };
        }
        let values = window.values();
        Self {
            mean: mean(&values),
            std: sample_std(&values),
        }
    }
}

/// Builds the per-city-month supervised-learning feature matrix.
pub struct FeatureBuilder {
    settings: FeatureSettings,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self {
            settings: FeatureSettings::default(),
        }
    }

    pub fn with_settings(settings: FeatureSettings) -> Self {
        Self { settings }
    }

    /// Build feature rows for every city month that has a complete trailing
    /// history. Months whose `anomaly_tmean` is undefined contribute nothing
    /// to the windows, but still count as an existing next month for the
    /// forward label.
    pub fn build(
        &self,
        anomalies: &[AnomalyRecord],
        correlation_summary: &BTreeMap<u32, CityCorrelationSummary>,
    ) -> Result<Vec<FeatureVector>> {
        let by_city = Self::index_by_city(anomalies)?;

        let mut features: Vec<FeatureVector> = by_city
            .par_iter()
            .flat_map_iter(|(&city_id, records)| {
                self.build_city(city_id, records, correlation_summary.get(&city_id))
            })
            .collect();

        features.sort_by_key(|f| (f.city_id, f.year, f.month));

        debug!(
            anomalies = anomalies.len(),
            rows = features.len(),
            positives = features.iter().filter(|f| f.is_event_next_month == 1).count(),
            "built feature vectors"
        );
        Ok(features)
    }

    fn index_by_city(
        anomalies: &[AnomalyRecord],
    ) -> Result<BTreeMap<u32, BTreeMap<i32, &AnomalyRecord>>> {
        let mut by_city: BTreeMap<u32, BTreeMap<i32, &AnomalyRecord>> = BTreeMap::new();
        for record in anomalies {
            if by_city
                .entry(record.city_id)
                .or_default()
                .insert(record.time_index(), record)
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
        Ok(by_city)
    }

    fn build_city(
        &self,
        city_id: u32,
        records: &BTreeMap<i32, &AnomalyRecord>,
        summary: Option<&CityCorrelationSummary>,
    ) -> Vec<FeatureVector> {
        // Ascending time order is what makes the windows trailing
        let series: BTreeMap<i32, f64> = records
            .iter()
            .filter_map(|(&t, r)| r.anomaly_tmean.map(|v| (t, v)))
            .collect();

        let mut short = TrailingWindow::new(SHORT_WINDOW_MONTHS);
        let mut long = TrailingWindow::new(LONG_WINDOW_MONTHS);
        let mut history = TrailingWindow::new(self.settings.min_history_months);
        let mut rows = Vec::new();

        for (&t, &value) in &series {
            short.push(t, value);
            long.push(t, value);
            history.push(t, value);

            let long_stats = WindowStats::of(&long, LONG_WINDOW_MONTHS);
            let Some(roll_mean_6) = long_stats.mean else {
                continue;
            };
            if !history.is_full() {
                continue;
            }

            // Current month plus at least one prior month
            let short_stats = WindowStats::of(&short, 2);

            let Some(record) = records.get(&t) else {
                continue;
            };
            let next = records.get(&(t + 1));
            let (sin_month, cos_month) = FeatureVector::seasonal_encoding(record.month);

            rows.push(FeatureVector {
                city_id,
                year: record.year,
                month: record.month,
                sin_month,
                cos_month,
                anomaly_tmean: value,
                roll_mean_3: short_stats.mean,
                roll_mean_6,
                roll_std_3: short_stats.std,
                roll_std_6: long_stats.std,
                delta_1m: series.get(&(t - 1)).map(|prev| value - prev),
                delta_3m: series.get(&(t - 3)).map(|prev| value - prev),
                max_lagged_corr: summary.map(|s| s.max_lagged_corr),
                lead_lag_months: summary.map(|s| s.lead_lag_months),
                is_event_next_month: u8::from(next.is_some_and(|n| n.is_strong_temp_anomaly())),
                has_next_month: next.is_some(),
            });
        }

        rows
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
