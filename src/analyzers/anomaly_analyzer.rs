use crate::error::{ProcessingError, Result};
use crate::models::{AnomalyRecord, CityMetadata, LagCorrelation};
use crate::utils::stats::time_index;
use crate::writers::ParquetWriter;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;

/// Inclusive (year, month) bounds of a dashboard query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: (i32, u32),
    pub end: (i32, u32),
}

impl MonthRange {
    pub fn new(start: (i32, u32), end: (i32, u32)) -> Self {
        Self { start, end }
    }

    pub fn years(start_year: i32, end_year: i32) -> Self {
        Self::new((start_year, 1), (end_year, 12))
    }

    pub fn contains(&self, year: i32, month: u32) -> bool {
        let t = time_index(year, month);
        time_index(self.start.0, self.start.1) <= t && t <= time_index(self.end.0, self.end.1)
    }
}

/// The month a record was observed in, with its anomaly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthExtreme {
    pub year: i32,
    pub month: u32,
    pub anomaly_tmean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityAnomalyStats {
    pub city_id: u32,
    pub months: usize,
    pub scored_months: usize,
    pub mean_anomaly_tmean: Option<f64>,
    pub positive_months: usize,
    pub negative_months: usize,
    pub strong_months: usize,
    pub warmest: Option<MonthExtreme>,
    pub coldest: Option<MonthExtreme>,
}

/// Queries over the anomaly and correlation datasets as a dashboard
/// consumes them: by city and time range.
pub struct AnomalyAnalyzer;

impl AnomalyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Load an anomaly dataset written by the pipeline
    pub fn load_anomalies(&self, path: &Path) -> Result<Vec<AnomalyRecord>> {
        let records: Vec<AnomalyRecord> = ParquetWriter::new().read(path)?;
        if records.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "No anomaly records in {}",
                path.display()
            )));
        }
        Ok(records)
    }

    pub fn load_correlations(&self, path: &Path) -> Result<Vec<LagCorrelation>> {
        ParquetWriter::new().read(path)
    }

    /// Anomalies of one city (or all cities) within an inclusive month range
    pub fn filter_anomalies<'a>(
        &self,
        records: &'a [AnomalyRecord],
        city_id: Option<u32>,
        range: Option<MonthRange>,
    ) -> Vec<&'a AnomalyRecord> {
        records
            .iter()
            .filter(|r| city_id.map_or(true, |c| r.city_id == c))
            .filter(|r| range.map_or(true, |m| m.contains(r.year, r.month)))
            .collect()
    }

    /// Correlations involving a city on either side, within a lag range
    pub fn filter_correlations<'a>(
        &self,
        records: &'a [LagCorrelation],
        city_id: Option<u32>,
        lags: Option<RangeInclusive<i32>>,
    ) -> Vec<&'a LagCorrelation> {
        records
            .iter()
            .filter(|r| city_id.map_or(true, |c| r.involves(c)))
            .filter(|r| lags.as_ref().map_or(true, |l| l.contains(&r.lag_months)))
            .collect()
    }

    pub fn city_statistics(&self, records: &[AnomalyRecord]) -> BTreeMap<u32, CityAnomalyStats> {
        let mut by_city: BTreeMap<u32, Vec<&AnomalyRecord>> = BTreeMap::new();
        for record in records {
            by_city.entry(record.city_id).or_default().push(record);
        }

        by_city
            .into_iter()
            .map(|(city_id, rows)| (city_id, Self::summarize_city(city_id, &rows)))
            .collect()
    }

    fn summarize_city(city_id: u32, rows: &[&AnomalyRecord]) -> CityAnomalyStats {
        let scored: Vec<MonthExtreme> = rows
            .iter()
            .filter_map(|r| {
                r.anomaly_tmean.map(|anomaly_tmean| MonthExtreme {
                    year: r.year,
                    month: r.month,
                    anomaly_tmean,
                })
            })
            .collect();

        let mean_anomaly_tmean = (!scored.is_empty())
            .then(|| scored.iter().map(|m| m.anomaly_tmean).sum::<f64>() / scored.len() as f64);

        // Earliest month wins ties
        let warmest = scored
            .iter()
            .copied()
            .reduce(|best, m| if m.anomaly_tmean > best.anomaly_tmean { m } else { best });
        let coldest = scored
            .iter()
            .copied()
            .reduce(|best, m| if m.anomaly_tmean < best.anomaly_tmean { m } else { best });

        CityAnomalyStats {
            city_id,
            months: rows.len(),
            scored_months: scored.len(),
            mean_anomaly_tmean,
            positive_months: rows.iter().filter(|r| r.is_positive_temp_anomaly).count(),
            negative_months: rows.iter().filter(|r| r.is_negative_temp_anomaly).count(),
            strong_months: rows.iter().filter(|r| r.is_strong_temp_anomaly()).count(),
            warmest,
            coldest,
        }
    }

    pub fn generate_report(
        &self,
        stats: &BTreeMap<u32, CityAnomalyStats>,
        cities: &BTreeMap<u32, CityMetadata>,
    ) -> String {
        let mut report = String::from("=== City Anomaly Summary ===\n");

        for s in stats.values() {
            let name = cities
                .get(&s.city_id)
                .map(CityMetadata::label)
                .unwrap_or_else(|| format!("City {}", s.city_id));

            report.push_str(&format!(
                "{}: {} months ({} scored), mean {}, +{} / -{} / strong {}\n",
                name,
                s.months,
                s.scored_months,
                s.mean_anomaly_tmean
                    .map(|m| format!("{:+.2}°C", m))
                    .unwrap_or_else(|| "n/a".to_string()),
                s.positive_months,
                s.negative_months,
                s.strong_months,
            ));
            if let (Some(w), Some(c)) = (s.warmest, s.coldest) {
                report.push_str(&format!(
                    "  warmest {}-{:02} ({:+.2}°C), coldest {}-{:02} ({:+.2}°C)\n",
                    w.year, w.month, w.anomaly_tmean, c.year, c.month, c.anomaly_tmean
                ));
            }
        }

        report
    }
}

impl Default for AnomalyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anomaly(city_id: u32, year: i32, month: u32, value: Option<f64>) -> AnomalyRecord {
        AnomalyRecord {
            city_id,
            year,
            month,
            avg_tmean: None,
            total_precip: None,
            anomaly_tmean: value,
            anomaly_precip: None,
            zscore_tmean: None,
            zscore_precip: None,
            is_positive_temp_anomaly: value.is_some_and(|v| v >= 1.0),
            is_negative_temp_anomaly: value.is_some_and(|v| v <= -1.0),
            is_strong_positive_temp_anomaly: false,
            is_strong_negative_temp_anomaly: false,
        }
    }

    #[test]
    fn test_filter_by_city_and_month_range() {
        let records = vec![
            anomaly(1, 2019, 12, Some(0.5)),
            anomaly(1, 2020, 1, Some(1.5)),
            anomaly(1, 2020, 6, Some(-1.2)),
            anomaly(2, 2020, 1, Some(0.1)),
        ];
        let analyzer = AnomalyAnalyzer::new();

        let range = MonthRange::new((2019, 12), (2020, 1));
        let filtered = analyzer.filter_anomalies(&records, Some(1), Some(range));
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.city_id == 1));

        let year = analyzer.filter_anomalies(&records, None, Some(MonthRange::years(2020, 2020)));
        assert_eq!(year.len(), 3);
    }

    #[test]
    fn test_filter_correlations_either_side() {
        let corr = |a, b, lag| LagCorrelation {
            city_id_a: a,
            city_id_b: b,
            lag_months: lag,
            n_observations: 10,
            correlation: Some(0.5),
        };
        let records = vec![corr(1, 2, 0), corr(2, 1, 0), corr(2, 3, 4), corr(3, 2, -4)];
        let analyzer = AnomalyAnalyzer::new();

        assert_eq!(analyzer.filter_correlations(&records, Some(1), None).len(), 2);
        assert_eq!(analyzer.filter_correlations(&records, Some(3), Some(0..=6)).len(), 1);
    }

    #[test]
    fn test_city_statistics() {
        let records = vec![
            anomaly(1, 2020, 1, Some(1.5)),
            anomaly(1, 2020, 2, Some(-2.0)),
            anomaly(1, 2020, 3, None),
            anomaly(1, 2020, 4, Some(1.5)),
        ];

        let stats = AnomalyAnalyzer::new().city_statistics(&records);
        let city = &stats[&1];
        assert_eq!(city.months, 4);
        assert_eq!(city.scored_months, 3);
        assert_eq!(city.positive_months, 2);
        assert_eq!(city.negative_months, 1);
        assert_eq!(city.warmest.map(|w| w.month), Some(1));
        assert_eq!(city.coldest.map(|c| c.month), Some(2));
        assert!((city.mean_anomaly_tmean.unwrap() - 1.0 / 3.0).abs() < 1e-12);

        let report = AnomalyAnalyzer::new().generate_report(&stats, &BTreeMap::new());
        assert!(report.contains("City 1: 4 months (3 scored)"));
    }
}
