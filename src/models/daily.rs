use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::TEMP_RELATIONSHIP_TOLERANCE;

/// Threshold flags derived for a single day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFlags {
    pub is_heat_day: bool,
    pub is_tropical_night: bool,
    pub is_heavy_precip_day: bool,
    pub is_summer_day: bool,
}

/// One city's weather for one day, keyed by `(city_id, date)`.
///
/// Any measurement may be null; flags are false for a null source value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DailyObservation {
    #[validate(range(min = 1))]
    pub city_id: u32,
    pub date: NaiveDate,

    // Temperatures (°C)
    #[validate(range(min = -90.0, max = 60.0))]
    pub tmax: Option<f64>,

    #[validate(range(min = -90.0, max = 60.0))]
    pub tmin: Option<f64>,

    #[validate(range(min = -90.0, max = 60.0))]
    pub tmean: Option<f64>,

    #[validate(range(min = -90.0, max = 60.0))]
    pub dewpoint: Option<f64>,

    // Daily precipitation sum (mm)
    #[validate(range(min = 0.0, max = 2000.0))]
    pub precip_mm: Option<f64>,

    // Maximum wind speed (km/h)
    #[validate(range(min = 0.0, max = 500.0))]
    pub wind_max: Option<f64>,

    // Shortwave radiation sum (MJ/m²)
    #[validate(range(min = 0.0))]
    pub shortwave_radiation: Option<f64>,

    #[serde(default)]
    pub flags: DayFlags,
}

impl DailyObservation {
    pub fn builder() -> DailyObservationBuilder {
        DailyObservationBuilder::new()
    }

    pub fn key(&self) -> (u32, NaiveDate) {
        (self.city_id, self.date)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Field ranges plus tmin <= tmean <= tmax (with tolerance) when present
    pub fn validate_relationships(&self) -> Result<()> {
        let tolerance = TEMP_RELATIONSHIP_TOLERANCE;

        // Range checks pass NaN, so non-finite values are caught here
        let measures = [
            ("tmax", self.tmax),
            ("tmin", self.tmin),
            ("tmean", self.tmean),
            ("dewpoint", self.dewpoint),
            ("precip_mm", self.precip_mm),
            ("wind_max", self.wind_max),
            ("shortwave_radiation", self.shortwave_radiation),
        ];
        if let Some((field, value)) = measures
            .iter()
            .find_map(|(field, v)| v.filter(|v| !v.is_finite()).map(|v| (field, v)))
        {
            return Err(self.relationship_error(format!("{} is not finite ({})", field, value)));
        }

        if let (Some(min), Some(mean)) = (self.tmin, self.tmean) {
            if min > mean + tolerance {
                return Err(self.relationship_error(format!(
                    "tmin {} > tmean {} (tolerance={})",
                    min, mean, tolerance
                )));
            }
        }

        if let (Some(mean), Some(max)) = (self.tmean, self.tmax) {
            if mean > max + tolerance {
                return Err(self.relationship_error(format!(
                    "tmean {} > tmax {} (tolerance={})",
                    mean, max, tolerance
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.tmin, self.tmax) {
            if min > max + tolerance {
                return Err(self.relationship_error(format!(
                    "tmin {} > tmax {} (tolerance={})",
                    min, max, tolerance
                )));
            }
        }

        self.validate()?;
        Ok(())
    }

    fn relationship_error(&self, detail: String) -> ProcessingError {
        ProcessingError::ObservationValidation {
            message: format!("city {} on {}: {}", self.city_id, self.date, detail),
        }
    }

    pub fn has_temperature_data(&self) -> bool {
        self.tmin.is_some() || self.tmax.is_some() || self.tmean.is_some()
    }
}

#[derive(Default)]
pub struct DailyObservationBuilder {
    city_id: Option<u32>,
    date: Option<NaiveDate>,
    tmax: Option<f64>,
    tmin: Option<f64>,
    tmean: Option<f64>,
    dewpoint: Option<f64>,
    precip_mm: Option<f64>,
    wind_max: Option<f64>,
    shortwave_radiation: Option<f64>,
}

impl DailyObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city_id(mut self, id: u32) -> Self {
        self.city_id = Some(id);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn temperatures(mut self, min: f64, mean: f64, max: f64) -> Self {
        self.tmin = Some(min);
        self.tmean = Some(mean);
        self.tmax = Some(max);
        self
    }

    pub fn tmean(mut self, tmean: f64) -> Self {
        self.tmean = Some(tmean);
        self
    }

    pub fn tmax(mut self, tmax: f64) -> Self {
        self.tmax = Some(tmax);
        self
    }

    pub fn tmin(mut self, tmin: f64) -> Self {
        self.tmin = Some(tmin);
        self
    }

    pub fn dewpoint(mut self, dewpoint: f64) -> Self {
        self.dewpoint = Some(dewpoint);
        self
    }

    pub fn precip_mm(mut self, precip: f64) -> Self {
        self.precip_mm = Some(precip);
        self
    }

    pub fn wind_max(mut self, wind: f64) -> Self {
        self.wind_max = Some(wind);
        self
    }

    pub fn shortwave_radiation(mut self, radiation: f64) -> Self {
        self.shortwave_radiation = Some(radiation);
        self
    }

    pub fn build(self) -> Result<DailyObservation> {
        let observation = DailyObservation {
            city_id: self
                .city_id
                .ok_or_else(|| ProcessingError::MissingData("city_id".to_string()))?,
            date: self
                .date
                .ok_or_else(|| ProcessingError::MissingData("date".to_string()))?,
            tmax: self.tmax,
            tmin: self.tmin,
            tmean: self.tmean,
            dewpoint: self.dewpoint,
            precip_mm: self.precip_mm,
            wind_max: self.wind_max,
            shortwave_radiation: self.shortwave_radiation,
            flags: DayFlags::default(),
        };

        observation.validate_relationships()?;
        Ok(observation)
    }
}
