use crate::error::{ProcessingError, Result};
use crate::models::{
    AnomalyRecord, ClimatologyBaseline, EventRecord, FeatureVector, LagCorrelation,
    MonthlyAggregate,
};
use crate::utils::constants::*;
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// A derived dataset row that can be laid out as an Arrow record batch.
///
/// Undefined statistics map to nullable Float64 columns.
pub trait ArrowRecord: Sized {
    /// File stem of the dataset
    const DATASET: &'static str;

    fn schema() -> Arc<Schema>;

    fn to_batch(records: &[Self], schema: Arc<Schema>) -> Result<RecordBatch>;
}

/// Read side of [`ArrowRecord`] for the datasets consumers query back
pub trait FromArrow: Sized {
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>>;
}

fn key_fields() -> Vec<Field> {
    vec![
        Field::new("city_id", DataType::UInt32, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::UInt32, false),
    ]
}

fn nullable_f64(name: &str) -> Field {
    Field::new(name, DataType::Float64, true)
}

fn u32_column<T>(records: &[T], f: impl Fn(&T) -> u32) -> ArrayRef {
    Arc::new(UInt32Array::from(records.iter().map(f).collect::<Vec<_>>()))
}

fn i32_column<T>(records: &[T], f: impl Fn(&T) -> i32) -> ArrayRef {
    Arc::new(Int32Array::from(records.iter().map(f).collect::<Vec<_>>()))
}

fn f64_column<T>(records: &[T], f: impl Fn(&T) -> Option<f64>) -> ArrayRef {
    Arc::new(Float64Array::from(records.iter().map(f).collect::<Vec<_>>()))
}

fn bool_column<T>(records: &[T], f: impl Fn(&T) -> bool) -> ArrayRef {
    Arc::new(BooleanArray::from(records.iter().map(f).collect::<Vec<_>>()))
}

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Missing or invalid {} column", name)))
}

fn optional(array: &Float64Array, i: usize) -> Option<f64> {
    array.is_valid(i).then(|| array.value(i))
}

impl ArrowRecord for MonthlyAggregate {
    const DATASET: &'static str = MONTHLY_DATASET;

    fn schema() -> Arc<Schema> {
        let mut fields = key_fields();
        fields.extend([
            nullable_f64("avg_tmean"),
            nullable_f64("avg_tmax"),
            nullable_f64("avg_tmin"),
            nullable_f64("avg_dewpoint"),
            nullable_f64("avg_wind_max"),
            nullable_f64("avg_shortwave_radiation"),
            nullable_f64("total_precip"),
            Field::new("heat_day_count", DataType::UInt32, false),
            Field::new("tropical_night_count", DataType::UInt32, false),
            Field::new("heavy_precip_day_count", DataType::UInt32, false),
            Field::new("summer_day_count", DataType::UInt32, false),
            Field::new("days_in_month", DataType::UInt32, false),
        ]);
        Arc::new(Schema::new(fields))
    }

    fn to_batch(records: &[Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            schema,
            vec![
                u32_column(records, |r| r.city_id),
                i32_column(records, |r| r.year),
                u32_column(records, |r| r.month),
                f64_column(records, |r| r.avg_tmean),
                f64_column(records, |r| r.avg_tmax),
                f64_column(records, |r| r.avg_tmin),
                f64_column(records, |r| r.avg_dewpoint),
                f64_column(records, |r| r.avg_wind_max),
                f64_column(records, |r| r.avg_shortwave_radiation),
                f64_column(records, |r| r.total_precip),
                u32_column(records, |r| r.heat_day_count),
                u32_column(records, |r| r.tropical_night_count),
                u32_column(records, |r| r.heavy_precip_day_count),
                u32_column(records, |r| r.summer_day_count),
                u32_column(records, |r| r.days_in_month),
            ],
        )?)
    }
}

impl ArrowRecord for ClimatologyBaseline {
    const DATASET: &'static str = BASELINE_DATASET;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("city_id", DataType::UInt32, false),
            Field::new("month", DataType::UInt32, false),
            Field::new("n_years", DataType::UInt32, false),
            nullable_f64("mean_tmean"),
            nullable_f64("mean_tmax"),
            nullable_f64("mean_tmin"),
            nullable_f64("mean_precip"),
            nullable_f64("std_tmean"),
            nullable_f64("std_precip"),
        ]))
    }

    fn to_batch(records: &[Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            schema,
            vec![
                u32_column(records, |r| r.city_id),
                u32_column(records, |r| r.month),
                u32_column(records, |r| r.n_years),
                f64_column(records, |r| r.mean_tmean),
                f64_column(records, |r| r.mean_tmax),
                f64_column(records, |r| r.mean_tmin),
                f64_column(records, |r| r.mean_precip),
                f64_column(records, |r| r.std_tmean),
                f64_column(records, |r| r.std_precip),
            ],
        )?)
    }
}

impl ArrowRecord for AnomalyRecord {
    const DATASET: &'static str = ANOMALY_DATASET;

    fn schema() -> Arc<Schema> {
        let mut fields = key_fields();
        fields.extend([
            nullable_f64("avg_tmean"),
            nullable_f64("total_precip"),
            nullable_f64("anomaly_tmean"),
            nullable_f64("anomaly_precip"),
            nullable_f64("zscore_tmean"),
            nullable_f64("zscore_precip"),
            Field::new("is_positive_temp_anomaly", DataType::Boolean, false),
            Field::new("is_negative_temp_anomaly", DataType::Boolean, false),
            Field::new("is_strong_positive_temp_anomaly", DataType::Boolean, false),
            Field::new("is_strong_negative_temp_anomaly", DataType::Boolean, false),
        ]);
        Arc::new(Schema::new(fields))
    }

    fn to_batch(records: &[Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            schema,
            vec![
                u32_column(records, |r| r.city_id),
                i32_column(records, |r| r.year),
                u32_column(records, |r| r.month),
                f64_column(records, |r| r.avg_tmean),
                f64_column(records, |r| r.total_precip),
                f64_column(records, |r| r.anomaly_tmean),
                f64_column(records, |r| r.anomaly_precip),
                f64_column(records, |r| r.zscore_tmean),
                f64_column(records, |r| r.zscore_precip),
                bool_column(records, |r| r.is_positive_temp_anomaly),
                bool_column(records, |r| r.is_negative_temp_anomaly),
                bool_column(records, |r| r.is_strong_positive_temp_anomaly),
                bool_column(records, |r| r.is_strong_negative_temp_anomaly),
            ],
        )?)
    }
}

impl FromArrow for AnomalyRecord {
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let city_ids = column::<UInt32Array>(batch, "city_id")?;
        let years = column::<Int32Array>(batch, "year")?;
        let months = column::<UInt32Array>(batch, "month")?;
        let avg_tmean = column::<Float64Array>(batch, "avg_tmean")?;
        let total_precip = column::<Float64Array>(batch, "total_precip")?;
        let anomaly_tmean = column::<Float64Array>(batch, "anomaly_tmean")?;
        let anomaly_precip = column::<Float64Array>(batch, "anomaly_precip")?;
        let zscore_tmean = column::<Float64Array>(batch, "zscore_tmean")?;
        let zscore_precip = column::<Float64Array>(batch, "zscore_precip")?;
        let positive = column::<BooleanArray>(batch, "is_positive_temp_anomaly")?;
        let negative = column::<BooleanArray>(batch, "is_negative_temp_anomaly")?;
        let strong_positive = column::<BooleanArray>(batch, "is_strong_positive_temp_anomaly")?;
        let strong_negative = column::<BooleanArray>(batch, "is_strong_negative_temp_anomaly")?;

        Ok((0..batch.num_rows())
            .map(|i| AnomalyRecord {
                city_id: city_ids.value(i),
                year: years.value(i),
                month: months.value(i),
                avg_tmean: optional(avg_tmean, i),
                total_precip: optional(total_precip, i),
                anomaly_tmean: optional(anomaly_tmean, i),
                anomaly_precip: optional(anomaly_precip, i),
                zscore_tmean: optional(zscore_tmean, i),
                zscore_precip: optional(zscore_precip, i),
                is_positive_temp_anomaly: positive.value(i),
                is_negative_temp_anomaly: negative.value(i),
                is_strong_positive_temp_anomaly: strong_positive.value(i),
                is_strong_negative_temp_anomaly: strong_negative.value(i),
            })
            .collect())
    }
}

impl ArrowRecord for EventRecord {
    const DATASET: &'static str = EVENT_DATASET;

    fn schema() -> Arc<Schema> {
        let mut fields = key_fields();
        fields.extend([
            nullable_f64("zscore_tmean"),
            Field::new("is_hot_event", DataType::Boolean, false),
            Field::new("is_cold_event", DataType::Boolean, false),
            Field::new("is_extreme_event", DataType::Boolean, false),
        ]);
        Arc::new(Schema::new(fields))
    }

    fn to_batch(records: &[Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            schema,
            vec![
                u32_column(records, |r| r.city_id),
                i32_column(records, |r| r.year),
                u32_column(records, |r| r.month),
                f64_column(records, |r| r.zscore_tmean),
                bool_column(records, |r| r.is_hot_event),
                bool_column(records, |r| r.is_cold_event),
                bool_column(records, |r| r.is_extreme_event),
            ],
        )?)
    }
}

impl ArrowRecord for LagCorrelation {
    const DATASET: &'static str = CORRELATION_DATASET;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("city_id_a", DataType::UInt32, false),
            Field::new("city_id_b", DataType::UInt32, false),
            Field::new("lag_months", DataType::Int32, false),
            Field::new("n_observations", DataType::UInt32, false),
            nullable_f64("correlation"),
        ]))
    }

    fn to_batch(records: &[Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            schema,
            vec![
                u32_column(records, |r| r.city_id_a),
                u32_column(records, |r| r.city_id_b),
                i32_column(records, |r| r.lag_months),
                u32_column(records, |r| r.n_observations),
                f64_column(records, |r| r.correlation),
            ],
        )?)
    }
}

impl FromArrow for LagCorrelation {
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let city_a = column::<UInt32Array>(batch, "city_id_a")?;
        let city_b = column::<UInt32Array>(batch, "city_id_b")?;
        let lags = column::<Int32Array>(batch, "lag_months")?;
        let n_observations = column::<UInt32Array>(batch, "n_observations")?;
        let correlations = column::<Float64Array>(batch, "correlation")?;

        Ok((0..batch.num_rows())
            .map(|i| LagCorrelation {
                city_id_a: city_a.value(i),
                city_id_b: city_b.value(i),
                lag_months: lags.value(i),
                n_observations: n_observations.value(i),
                correlation: optional(correlations, i),
            })
            .collect())
    }
}

impl ArrowRecord for FeatureVector {
    const DATASET: &'static str = FEATURE_DATASET;

    fn schema() -> Arc<Schema> {
        let mut fields = key_fields();
        fields.extend([
            Field::new("anomaly_tmean", DataType::Float64, false),
            nullable_f64("roll_mean_3"),
            Field::new("roll_mean_6", DataType::Float64, false),
            nullable_f64("roll_std_3"),
            nullable_f64("roll_std_6"),
            nullable_f64("delta_1m"),
            nullable_f64("delta_3m"),
            nullable_f64("max_lagged_corr"),
            Field::new("lead_lag_months", DataType::Int32, true),
            Field::new("sin_month", DataType::Float64, false),
            Field::new("cos_month", DataType::Float64, false),
            Field::new("is_event_next_month", DataType::UInt8, false),
            Field::new("has_next_month", DataType::Boolean, false),
        ]);
        Arc::new(Schema::new(fields))
    }

    fn to_batch(records: &[Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        let lead_lags: Vec<Option<i32>> = records.iter().map(|r| r.lead_lag_months).collect();
        let labels: Vec<u8> = records.iter().map(|r| r.is_event_next_month).collect();

        Ok(RecordBatch::try_new(
            schema,
            vec![
                u32_column(records, |r| r.city_id),
                i32_column(records, |r| r.year),
                u32_column(records, |r| r.month),
                f64_column(records, |r| Some(r.anomaly_tmean)),
                f64_column(records, |r| r.roll_mean_3),
                f64_column(records, |r| Some(r.roll_mean_6)),
                f64_column(records, |r| r.roll_std_3),
                f64_column(records, |r| r.roll_std_6),
                f64_column(records, |r| r.delta_1m),
                f64_column(records, |r| r.delta_3m),
                f64_column(records, |r| r.max_lagged_corr),
                Arc::new(Int32Array::from(lead_lags)),
                f64_column(records, |r| Some(r.sin_month)),
                f64_column(records, |r| Some(r.cos_month)),
                Arc::new(UInt8Array::from(labels)),
                bool_column(records, |r| r.has_next_month),
            ],
        )?)
    }
}
