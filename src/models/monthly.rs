use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::utils::stats::time_index;

/// One row per (city_id, year, month) reduced from daily observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub city_id: u32,
    pub year: i32,
    pub month: u32,

    pub avg_tmean: Option<f64>,
    pub avg_tmax: Option<f64>,
    pub avg_tmin: Option<f64>,
    pub avg_dewpoint: Option<f64>,
    pub avg_wind_max: Option<f64>,
    pub avg_shortwave_radiation: Option<f64>,
    pub total_precip: Option<f64>,

    pub heat_day_count: u32,
    pub tropical_night_count: u32,
    pub heavy_precip_day_count: u32,
    pub summer_day_count: u32,

    /// Number of daily rows that contributed; missing days lower it.
    pub days_in_month: u32,
}

impl MonthlyAggregate {
    /// Empty aggregate for a period; statistics are filled in by the
    /// aggregator or the `with_*` setters.
    pub fn new(city_id: u32, year: i32, month: u32) -> Self {
        Self {
            city_id,
            year,
            month,
            avg_tmean: None,
            avg_tmax: None,
            avg_tmin: None,
            avg_dewpoint: None,
            avg_wind_max: None,
            avg_shortwave_radiation: None,
            total_precip: None,
            heat_day_count: 0,
            tropical_night_count: 0,
            heavy_precip_day_count: 0,
            summer_day_count: 0,
            days_in_month: 0,
        }
    }

    pub fn with_tmean(mut self, avg_tmean: f64) -> Self {
        self.avg_tmean = Some(avg_tmean);
        self
    }

    pub fn with_precip(mut self, total_precip: f64) -> Self {
        self.total_precip = Some(total_precip);
        self
    }

    pub fn with_days(mut self, days_in_month: u32) -> Self {
        self.days_in_month = days_in_month;
        self
    }

    pub fn time_index(&self) -> i32 {
        time_index(self.year, self.month)
    }

    pub fn key(&self) -> (u32, i32, u32) {
        (self.city_id, self.year, self.month)
    }

    pub fn check_month(&self) -> Result<()> {
        if !(1..=12).contains(&self.month) {
            return Err(ProcessingError::InvalidMonth {
                city_id: self.city_id,
                month: self.month,
            });
        }
        Ok(())
    }
}
