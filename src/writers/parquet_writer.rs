use crate::error::{ProcessingError, Result};
use crate::models::RunSummary;
use crate::processors::PipelineOutput;
use crate::utils::constants::*;
use crate::utils::filename::dataset_path;
use crate::writers::schema::{ArrowRecord, FromArrow};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }

    /// Write a dataset to one Parquet file. An empty dataset still produces
    /// a file carrying the schema, so a rerun always replaces stale output.
    pub fn write<T: ArrowRecord>(&self, records: &[T], path: &Path) -> Result<()> {
        let schema = T::schema();
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(self.properties()))?;

        if !records.is_empty() {
            let batch = T::to_batch(records, schema)?;
            writer.write(&batch)?;
        }

        writer.close()?;
        debug!(dataset = T::DATASET, rows = records.len(), path = %path.display(), "wrote parquet");
        Ok(())
    }

    /// Write records in batches for memory efficiency
    pub fn write_batched<T: ArrowRecord>(
        &self,
        records: &[T],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        let schema = T::schema();
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(self.properties()))?;

        for chunk in records.chunks(batch_size.max(1)) {
            let batch = T::to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    /// Read a whole dataset back
    pub fn read<T: FromArrow>(&self, path: &Path) -> Result<Vec<T>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut records = Vec::new();
        for batch in reader {
            records.extend(T::from_batch(&batch?)?);
        }
        Ok(records)
    }

    /// Replace every derived dataset under `output_dir`, returning the paths
    /// written in pipeline order
    pub fn write_outputs(&self, output: &PipelineOutput, output_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;

        let paths = vec![
            self.write_dataset(&output.monthly, output_dir)?,
            self.write_dataset(&output.baselines, output_dir)?,
            self.write_dataset(&output.anomalies, output_dir)?,
            self.write_dataset(&output.events, output_dir)?,
            self.write_dataset(&output.correlations, output_dir)?,
            self.write_dataset(&output.features, output_dir)?,
        ];

        info!(files = paths.len(), output_dir = %output_dir.display(), "wrote derived datasets");
        Ok(paths)
    }

    fn write_dataset<T: ArrowRecord>(&self, records: &[T], output_dir: &Path) -> Result<PathBuf> {
        let path = dataset_path(output_dir, T::DATASET);
        self.write(records, &path)?;
        Ok(path)
    }

    pub fn write_run_summary(&self, summary: &RunSummary, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(RUN_SUMMARY_FILE);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, summary)?;
        Ok(path)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        // Codec as recorded in the file, not the writer's setting
        let compression = (row_groups > 0 && metadata.row_group(0).num_columns() > 0)
            .then(|| metadata.row_group(0).column(0).compression());

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            columns,
            file_size,
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub columns: Vec<String>,
    pub file_size: u64,
    pub compression: Option<Compression>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        let compression = self
            .compression
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {}\n\
            - Avg rows per group: {:.0}\n\
            - Columns ({}): {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            compression,
            avg_rows,
            self.columns.len(),
            self.columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnomalyRecord, LagCorrelation, RunStatus};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::{NamedTempFile, TempDir};

    fn anomaly(month: u32, anomaly_tmean: Option<f64>) -> AnomalyRecord {
        AnomalyRecord {
            city_id: 1,
            year: 2015,
            month,
            avg_tmean: anomaly_tmean.map(|a| 12.0 + a),
            total_precip: Some(42.0),
            anomaly_tmean,
            anomaly_precip: Some(-3.0),
            zscore_tmean: anomaly_tmean.map(|a| a / 0.8),
            zscore_precip: None,
            is_positive_temp_anomaly: anomaly_tmean.is_some_and(|a| a >= 1.0),
            is_negative_temp_anomaly: false,
            is_strong_positive_temp_anomaly: false,
            is_strong_negative_temp_anomaly: false,
        }
    }

    #[test]
    fn test_write_empty_dataset_keeps_schema() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write::<LagCorrelation>(&[], temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 0);
        assert!(info.columns.contains(&"correlation".to_string()));
        Ok(())
    }

    #[test]
    fn test_anomaly_round_trip_preserves_nulls() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let records = vec![anomaly(1, Some(1.4)), anomaly(2, None)];

        writer.write(&records, temp_file.path())?;
        let read_back: Vec<AnomalyRecord> = writer.read(temp_file.path())?;

        pretty_assertions::assert_eq!(read_back, records);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write(&[anomaly(7, Some(0.3))], temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-ish").is_err());
        Ok(())
    }

    #[test]
    fn test_batched_write_row_groups() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(4);
        let temp_file = NamedTempFile::new()?;
        let records: Vec<AnomalyRecord> = (1..=12).map(|m| anomaly(m, Some(m as f64 / 10.0))).collect();

        writer.write_batched(&records, temp_file.path(), 5)?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 12);
        assert_eq!(info.row_group_sizes.iter().sum::<i64>(), 12);
        assert!(info.summary().contains("Total rows: 12"));
        Ok(())
    }

    #[test]
    fn test_run_summary_json() -> Result<()> {
        let dir = TempDir::new()?;
        let summary = RunSummary {
            flow_name: "climate_anomaly_pipeline".to_string(),
            run_mode: "backfill".to_string(),
            status: RunStatus::Success,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            baseline_start_year: 1981,
            baseline_end_year: 2010,
            rows: BTreeMap::from([("ml_features".to_string(), 10)]),
            error: None,
        };

        let path = ParquetWriter::new().write_run_summary(&summary, dir.path())?;
        let json: serde_json::Value = serde_json::from_reader(File::open(path)?)?;
        assert_eq!(json["status"], "success");
        assert_eq!(json["rows"]["ml_features"], 10);
        Ok(())
    }
}
