use crate::models::DailyObservation;
use crate::utils::constants::{FRESH_MAX_LAG_DAYS, STALE_MAX_LAG_DAYS};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// How far a city's latest observation trails the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
    VeryStale,
}

impl Freshness {
    pub fn classify(last_date: NaiveDate, reference: NaiveDate) -> Self {
        let lag_days = reference.signed_duration_since(last_date).num_days();
        if lag_days <= FRESH_MAX_LAG_DAYS {
            Freshness::Fresh
        } else if lag_days <= STALE_MAX_LAG_DAYS {
            Freshness::Stale
        } else {
            Freshness::VeryStale
        }
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::VeryStale => "very_stale",
        };
        write!(f, "{}", label)
    }
}

/// A run of consecutive missing days inside a city's observed span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGap {
    pub after: NaiveDate,
    pub before: NaiveDate,
    pub missing_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityCoverage {
    pub city_id: u32,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub n_days: usize,
    pub expected_days: i64,
    pub missing_days: i64,
    pub gaps: Vec<DateGap>,
    pub freshness: Freshness,
}

impl CityCoverage {
    pub fn completeness(&self) -> f64 {
        if self.expected_days == 0 {
            return 0.0;
        }
        self.n_days as f64 / self.expected_days as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub reference_date: NaiveDate,
    pub total_records: usize,
    pub records_missing_tmean: usize,
    pub cities: BTreeMap<u32, CityCoverage>,
}

impl IntegrityReport {
    /// Worst freshness across cities, `None` for an empty report
    pub fn worst_freshness(&self) -> Option<Freshness> {
        self.cities
            .values()
            .map(|c| c.freshness)
            .max_by_key(|f| match f {
                Freshness::Fresh => 0,
                Freshness::Stale => 1,
                Freshness::VeryStale => 2,
            })
    }
}

/// Reports per-city coverage and freshness of the daily layer.
///
/// Gaps are reported, never treated as errors.
pub struct IntegrityChecker {
    reference_date: NaiveDate,
}

impl IntegrityChecker {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Checker whose freshness is measured against today's date
    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    /// Observations need not be sorted
    pub fn check_integrity(&self, observations: &[DailyObservation]) -> IntegrityReport {
        let mut by_city: BTreeMap<u32, Vec<NaiveDate>> = BTreeMap::new();
        for observation in observations {
            by_city
                .entry(observation.city_id)
                .or_default()
                .push(observation.date);
        }

        let cities = by_city
            .into_iter()
            .filter_map(|(city_id, mut dates)| {
                dates.sort_unstable();
                dates.dedup();
                self.city_coverage(city_id, &dates)
                    .map(|coverage| (city_id, coverage))
            })
            .collect();

        IntegrityReport {
            reference_date: self.reference_date,
            total_records: observations.len(),
            records_missing_tmean: observations.iter().filter(|o| o.tmean.is_none()).count(),
            cities,
        }
    }

    fn city_coverage(&self, city_id: u32, dates: &[NaiveDate]) -> Option<CityCoverage> {
        let first_date = *dates.first()?;
        let last_date = *dates.last()?;
        let expected_days = last_date.signed_duration_since(first_date).num_days() + 1;

        let gaps: Vec<DateGap> = dates
            .windows(2)
            .filter_map(|pair| {
                let step = pair[1].signed_duration_since(pair[0]).num_days();
                (step > 1).then(|| DateGap {
                    after: pair[0],
                    before: pair[1],
                    missing_days: step - 1,
                })
            })
            .collect();

        Some(CityCoverage {
            city_id,
            first_date,
            last_date,
            n_days: dates.len(),
            expected_days,
            missing_days: expected_days - dates.len() as i64,
            gaps,
            freshness: Freshness::classify(last_date, self.reference_date),
        })
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Daily Layer Integrity Report ===\n");
        summary.push_str(&format!("Reference date: {}\n", report.reference_date));
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        summary.push_str(&format!(
            "Records without tmean: {}\n",
            report.records_missing_tmean
        ));
        summary.push_str(&format!("Cities: {}\n\n", report.cities.len()));

        for coverage in report.cities.values() {
            summary.push_str(&format!(
                "  City {:>3}: {} → {} | {} days ({:.1}% complete, {} missing in {} gaps) | {}\n",
                coverage.city_id,
                coverage.first_date,
                coverage.last_date,
                coverage.n_days,
                coverage.completeness() * 100.0,
                coverage.missing_days,
                coverage.gaps.len(),
                coverage.freshness
            ));
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::today()
    }
}
