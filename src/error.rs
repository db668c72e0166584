use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Observation validation error: {message}")]
    ObservationValidation { message: String },

    #[error("Duplicate observation for city {city_id} on {date}")]
    DuplicateKey { city_id: u32, date: NaiveDate },

    #[error("Duplicate {dataset} row for city {city_id}, {year}-{month:02}")]
    DuplicatePeriod {
        dataset: &'static str,
        city_id: u32,
        year: i32,
        month: u32,
    },

    #[error("Invalid month {month} for city {city_id} (expected 1..=12)")]
    InvalidMonth { city_id: u32, month: u32 },

    #[error("Invalid baseline period {start_year}..={end_year}")]
    InvalidBaselinePeriod { start_year: i32, end_year: i32 },

    #[error("City {city_id} not found")]
    CityNotFound { city_id: u32 },

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}
