use crate::error::{ProcessingError, Result};
use crate::models::{DailyObservation, DayFlags, MonthlyAggregate};
use crate::processors::DailyNormalizer;
use crate::utils::settings::Thresholds;
use crate::utils::stats::{mean_present, sum_present};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Reduces daily observations to one row per (city_id, year, month).
///
/// Event-day counts are derived from the aggregator's own thresholds, so
/// the input does not need to have passed through [`DailyNormalizer`].
pub struct MonthlyAggregator {
    flagger: DailyNormalizer,
}

impl MonthlyAggregator {
    pub fn new() -> Self {
        Self {
            flagger: DailyNormalizer::new(),
        }
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            flagger: DailyNormalizer::with_thresholds(thresholds),
        }
    }

    /// Aggregate every non-empty (city, year, month) partition.
    ///
    /// Missing days only lower `days_in_month`; a repeated (city_id, date)
    /// key is a primary-key violation and fails the stage.
    pub fn aggregate(&self, observations: &[DailyObservation]) -> Result<Vec<MonthlyAggregate>> {
        let by_city = self.group_by_city(observations)?;

        let mut aggregates: Vec<MonthlyAggregate> = by_city
            .par_iter()
            .flat_map_iter(|(&city_id, rows)| self.aggregate_city(city_id, rows))
            .collect();

        aggregates.sort_by_key(|a| a.key());

        debug!(
            days = observations.len(),
            months = aggregates.len(),
            "aggregated monthly climate"
        );
        Ok(aggregates)
    }

    fn group_by_city<'a>(
        &self,
        observations: &'a [DailyObservation],
    ) -> Result<BTreeMap<u32, Vec<&'a DailyObservation>>> {
        let mut seen = HashSet::with_capacity(observations.len());
        let mut by_city: BTreeMap<u32, Vec<&DailyObservation>> = BTreeMap::new();

        for observation in observations {
            if !seen.insert(observation.key()) {
                return Err(ProcessingError::DuplicateKey {
                    city_id: observation.city_id,
                    date: observation.date,
                });
            }
            by_city.entry(observation.city_id).or_default().push(observation);
        }

        Ok(by_city)
    }

    fn aggregate_city(&self, city_id: u32, rows: &[&DailyObservation]) -> Vec<MonthlyAggregate> {
        let mut partitions: BTreeMap<(i32, u32), Vec<&DailyObservation>> = BTreeMap::new();
        for row in rows {
            partitions.entry((row.year(), row.month())).or_default().push(row);
        }

        partitions
            .into_iter()
            .map(|((year, month), days)| self.reduce_partition(city_id, year, month, &days))
            .collect()
    }

    fn reduce_partition(
        &self,
        city_id: u32,
        year: i32,
        month: u32,
        days: &[&DailyObservation],
    ) -> MonthlyAggregate {
        let flags: Vec<DayFlags> = days.iter().map(|d| self.flagger.derive_flags(d)).collect();
        let count = |flag: fn(&DayFlags) -> bool| -> u32 {
            flags.iter().filter(|f| flag(f)).count() as u32
        };

        MonthlyAggregate {
            avg_tmean: mean_present(days.iter().map(|d| d.tmean)),
            avg_tmax: mean_present(days.iter().map(|d| d.tmax)),
            avg_tmin: mean_present(days.iter().map(|d| d.tmin)),
            avg_dewpoint: mean_present(days.iter().map(|d| d.dewpoint)),
            avg_wind_max: mean_present(days.iter().map(|d| d.wind_max)),
            avg_shortwave_radiation: mean_present(days.iter().map(|d| d.shortwave_radiation)),
            total_precip: sum_present(days.iter().map(|d| d.precip_mm)),
            heat_day_count: count(|f| f.is_heat_day),
            tropical_night_count: count(|f| f.is_tropical_night),
            heavy_precip_day_count: count(|f| f.is_heavy_precip_day),
            summer_day_count: count(|f| f.is_summer_day),
            days_in_month: days.len() as u32,
            ..MonthlyAggregate::new(city_id, year, month)
        }
    }
}

impl Default for MonthlyAggregator {
    fn default() -> Self {
        Self::new()
    }
}
