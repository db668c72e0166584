use chrono::NaiveDate;
use climate_anomaly::models::{AnomalyRecord, DailyObservation};
use climate_anomaly::processors::{
    AnomalyScorer, BaselineBuilder, ClimatePipeline, DailyNormalizer, FeatureBuilder,
    IntegrityChecker, LagCorrelator, MonthlyAggregator,
};
use climate_anomaly::utils::settings::{BaselinePeriod, PipelineSettings};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// Create synthetic daily observations for benchmarking
fn create_test_observations(city_count: usize, years: i32) -> Vec<DailyObservation> {
    let mut observations = Vec::new();
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let days = (365.25 * years as f64) as i64;

    for city_id in 1..=city_count {
        for day in 0..days {
            let date = start + chrono::Duration::days(day);
            let seasonal = 10.0 * (2.0 * std::f64::consts::PI * day as f64 / 365.25).sin();
            let wobble = ((day * 31 + city_id as i64 * 17) % 23) as f64 / 10.0;
            let tmean = 12.0 + seasonal + wobble + city_id as f64 * 0.2;

            observations.push(
                DailyObservation::builder()
                    .city_id(city_id as u32)
                    .date(date)
                    .temperatures(tmean - 5.0, tmean, tmean + 5.0)
                    .precip_mm(((day % 7) as f64) * 1.5)
                    .build()
                    .unwrap(),
            );
        }
    }

    observations
}

fn bench_settings(years: i32) -> PipelineSettings {
    PipelineSettings::default()
        .with_baseline(BaselinePeriod::new(2000, 2000 + years / 2).unwrap())
}

fn scored_anomalies(city_count: usize, years: i32) -> Vec<AnomalyRecord> {
    let daily = DailyNormalizer::new()
        .normalize(create_test_observations(city_count, years))
        .unwrap();
    let monthly = MonthlyAggregator::new().aggregate(&daily).unwrap();
    let baselines = BaselineBuilder::new(bench_settings(years).baseline)
        .build(&monthly)
        .unwrap();
    AnomalyScorer::new().score(&monthly, &baselines).unwrap()
}

fn benchmark_monthly_aggregator(c: &mut Criterion) {
    let daily = DailyNormalizer::new()
        .normalize(create_test_observations(10, 10))
        .unwrap();

    c.bench_function("monthly_aggregator", |b| {
        b.iter(|| {
            let monthly = MonthlyAggregator::new().aggregate(&daily).unwrap();
            black_box(monthly.len())
        })
    });
}

fn benchmark_integrity_checker(c: &mut Criterion) {
    let observations = create_test_observations(5, 5);
    let checker = IntegrityChecker::new(NaiveDate::from_ymd_opt(2005, 1, 1).unwrap());

    c.bench_function("integrity_checker", |b| {
        b.iter(|| {
            let report = checker.check_integrity(&observations);
            black_box(report.total_records)
        })
    });
}

fn benchmark_lag_correlator(c: &mut Criterion) {
    let mut group = c.benchmark_group("lag_correlator_by_cities");

    for &cities in &[2, 10, 25] {
        let anomalies = scored_anomalies(cities, 10);
        group.bench_with_input(BenchmarkId::new("cities", cities), &anomalies, |b, anomalies| {
            b.iter(|| {
                let correlations = LagCorrelator::new().correlate(anomalies).unwrap();
                black_box(LagCorrelator::summarize(&correlations).len())
            })
        });
    }
    group.finish();
}

fn benchmark_feature_builder(c: &mut Criterion) {
    let anomalies = scored_anomalies(10, 10);
    let correlations = LagCorrelator::new().correlate(&anomalies).unwrap();
    let summary = LagCorrelator::summarize(&correlations);

    c.bench_function("feature_builder", |b| {
        b.iter(|| {
            let features = FeatureBuilder::new().build(&anomalies, &summary).unwrap();
            black_box(features.len())
        })
    });
}

fn benchmark_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_by_cities");
    group.sample_size(10);

    for &cities in &[5, 20] {
        let observations = create_test_observations(cities, 10);
        let pipeline = ClimatePipeline::new(bench_settings(10));

        group.bench_with_input(
            BenchmarkId::new("cities", cities),
            &observations,
            |b, observations| {
                b.iter(|| {
                    let output = pipeline.run(observations.clone(), None).unwrap();
                    black_box(output.features.len())
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_monthly_aggregator,
    benchmark_integrity_checker,
    benchmark_lag_correlator,
    benchmark_feature_builder,
    benchmark_full_pipeline
);
criterion_main!(benches);
