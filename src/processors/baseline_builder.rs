use crate::error::{ProcessingError, Result};
use crate::models::{ClimatologyBaseline, MonthlyAggregate};
use crate::utils::settings::BaselinePeriod;
use crate::utils::stats::{mean, mean_present, sample_std};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Computes per-(city, calendar month) climatology over a fixed year range.
pub struct BaselineBuilder {
    period: BaselinePeriod,
}

impl BaselineBuilder {
    pub fn new(period: BaselinePeriod) -> Self {
        Self { period }
    }

    /// Build one baseline row per (city_id, month) with at least one
    /// monthly row inside the baseline period.
    ///
    /// Output is sorted by (city_id, month) and depends only on the input
    /// set, so rebuilding from the same rows gives identical results.
    pub fn build(&self, monthly: &[MonthlyAggregate]) -> Result<Vec<ClimatologyBaseline>> {
        self.period.check()?;
        check_monthly_keys(monthly, "monthly")?;

        let mut by_city: BTreeMap<u32, BTreeMap<u32, Vec<&MonthlyAggregate>>> = BTreeMap::new();
        for row in monthly.iter().filter(|r| self.period.contains(r.year)) {
            by_city
                .entry(row.city_id)
                .or_default()
                .entry(row.month)
                .or_default()
                .push(row);
        }

        let mut baselines: Vec<ClimatologyBaseline> = by_city
            .par_iter()
            .flat_map_iter(|(&city_id, months)| {
                months
                    .iter()
                    .map(move |(&month, rows)| Self::reduce(city_id, month, rows))
            })
            .collect();

        baselines.sort_by_key(|b| b.key());

        let undefined_std = baselines.iter().filter(|b| b.std_tmean.is_none()).count();
        if undefined_std > 0 {
            warn!(
                rows = undefined_std,
                "baseline rows without a tmean standard deviation; z-scores will be undefined"
            );
        }
        debug!(
            rows = baselines.len(),
            start_year = self.period.start_year,
            end_year = self.period.end_year,
            "built climatology baselines"
        );

        Ok(baselines)
    }

    fn reduce(city_id: u32, month: u32, rows: &[&MonthlyAggregate]) -> ClimatologyBaseline {
        // Rows are pushed in input order; sort by year so float sums do not
        // depend on how the caller ordered the monthly dataset.
        let mut rows = rows.to_vec();
        rows.sort_by_key(|r| r.year);

        let tmean: Vec<f64> = rows.iter().filter_map(|r| r.avg_tmean).collect();
        let precip: Vec<f64> = rows.iter().filter_map(|r| r.total_precip).collect();

        ClimatologyBaseline {
            city_id,
            month,
            n_years: rows.len() as u32,
            mean_tmean: mean(&tmean),
            mean_tmax: mean_present(rows.iter().map(|r| r.avg_tmax)),
            mean_tmin: mean_present(rows.iter().map(|r| r.avg_tmin)),
            mean_precip: mean(&precip),
            std_tmean: sample_std(&tmean),
            std_precip: sample_std(&precip),
        }
    }
}

impl Default for BaselineBuilder {
    fn default() -> Self {
        Self::new(BaselinePeriod::default())
    }
}

/// Months must be 1..=12 and (city_id, year, month) unique.
pub(crate) fn check_monthly_keys(monthly: &[MonthlyAggregate], dataset: &'static str) -> Result<()> {
    let mut seen = HashSet::with_capacity(monthly.len());
    for row in monthly {
        row.check_month()?;
        if !seen.insert(row.key()) {
            return Err(ProcessingError::DuplicatePeriod {
                dataset,
                city_id: row.city_id,
                year: row.year,
                month: row.month,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn period(start: i32, end: i32) -> BaselinePeriod {
        BaselinePeriod::new(start, end).unwrap()
    }

    #[test]
    fn test_mean_and_sample_std_within_period() {
        let monthly = vec![
            MonthlyAggregate::new(1, 1999, 1).with_tmean(100.0), // outside period
            MonthlyAggregate::new(1, 2000, 1).with_tmean(2.0).with_precip(10.0),
            MonthlyAggregate::new(1, 2001, 1).with_tmean(4.0).with_precip(30.0),
            MonthlyAggregate::new(1, 2002, 1).with_tmean(6.0),
            MonthlyAggregate::new(1, 2003, 1).with_tmean(-100.0), // outside period
        ];

        let baselines = BaselineBuilder::new(period(2000, 2002)).build(&monthly).unwrap();
        assert_eq!(baselines.len(), 1);

        let b = &baselines[0];
        assert_eq!(b.key(), (1, 1));
        assert_eq!(b.n_years, 3);
        assert_eq!(b.mean_tmean, Some(4.0));
        assert_eq!(b.std_tmean, Some(2.0));
        assert_eq!(b.mean_precip, Some(20.0));
        assert!((b.std_precip.unwrap() - 14.142135623730951).abs() < 1e-9);
    }

    #[test]
    fn test_single_year_leaves_std_undefined() {
        let monthly = vec![MonthlyAggregate::new(3, 2005, 7).with_tmean(25.0)];
        let baselines = BaselineBuilder::new(period(2000, 2010)).build(&monthly).unwrap();

        assert_eq!(baselines[0].mean_tmean, Some(25.0));
        assert_eq!(baselines[0].std_tmean, None);
        assert_eq!(baselines[0].usable_std_tmean(), None);
    }

    #[test]
    fn test_no_rows_means_no_baseline() {
        let monthly = vec![MonthlyAggregate::new(3, 2015, 7).with_tmean(25.0)];
        let baselines = BaselineBuilder::new(period(2000, 2010)).build(&monthly).unwrap();
        assert!(baselines.is_empty());
    }

    #[test]
    fn test_rebuild_is_identical_regardless_of_input_order() {
        let mut monthly: Vec<MonthlyAggregate> = (1990..2020)
            .flat_map(|year| {
                (1..=12).map(move |month| {
                    MonthlyAggregate::new(1, year, month)
                        .with_tmean(month as f64 + (year % 7) as f64 * 0.1)
                        .with_precip((year % 5) as f64 * 3.3)
                })
            })
            .collect();

        let builder = BaselineBuilder::new(period(1991, 2010));
        let first = builder.build(&monthly).unwrap();
        monthly.reverse();
        let second = builder.build(&monthly).unwrap();

        assert_eq!(first.len(), 12);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_month_fails() {
        let monthly = vec![MonthlyAggregate::new(1, 2000, 0).with_tmean(1.0)];
        assert!(matches!(
            BaselineBuilder::default().build(&monthly),
            Err(ProcessingError::InvalidMonth { month: 0, .. })
        ));
    }

    #[test]
    fn test_duplicate_period_fails() {
        let monthly = vec![
            MonthlyAggregate::new(1, 2000, 1).with_tmean(1.0),
            MonthlyAggregate::new(1, 2000, 1).with_tmean(2.0),
        ];
        assert!(matches!(
            BaselineBuilder::default().build(&monthly),
            Err(ProcessingError::DuplicatePeriod { .. })
        ));
    }
}
