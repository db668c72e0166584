use crate::error::{ProcessingError, Result};
use crate::models::{DailyObservation, DayFlags};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Column layout of a daily observation CSV; empty cells are null.
#[derive(Debug, Deserialize)]
struct ObservationRow {
    city_id: u32,
    date: String,
    tmax: Option<f64>,
    tmin: Option<f64>,
    tmean: Option<f64>,
    dewpoint: Option<f64>,
    precip_mm: Option<f64>,
    wind_max: Option<f64>,
    shortwave_radiation: Option<f64>,
}

impl ObservationRow {
    fn into_observation(self) -> Result<DailyObservation> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")?;
        Ok(DailyObservation {
            city_id: self.city_id,
            date,
            tmax: self.tmax,
            tmin: self.tmin,
            tmean: self.tmean,
            dewpoint: self.dewpoint,
            precip_mm: self.precip_mm,
            wind_max: self.wind_max,
            shortwave_radiation: self.shortwave_radiation,
            flags: DayFlags::default(),
        })
    }
}

/// Reads raw daily observations. Rows are not validated here; that is the
/// normalizer's job, so a malformed row only fails on parse errors.
pub struct ObservationReader {
    has_headers: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self { has_headers: true }
    }

    pub fn with_headers(has_headers: bool) -> Self {
        Self { has_headers }
    }

    pub fn read_observations(&self, path: &Path) -> Result<Vec<DailyObservation>> {
        let file = std::fs::File::open(path)?;
        self.read_from(file).map_err(|e| match e {
            ProcessingError::DateParse(err) => ProcessingError::InvalidFormat(format!(
                "{}: invalid date ({})",
                path.display(),
                err
            )),
            other => other,
        })
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<Vec<DailyObservation>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut observations = Vec::new();
        for row in reader.deserialize::<ObservationRow>() {
            observations.push(row?.into_observation()?);
        }
        Ok(observations)
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}
