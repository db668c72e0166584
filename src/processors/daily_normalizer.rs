use crate::error::{ProcessingError, Result};
use crate::models::{DailyObservation, DayFlags};
use crate::utils::settings::Thresholds;
use std::collections::HashSet;
use tracing::debug;

/// Validates raw daily rows and derives the per-day threshold flags.
pub struct DailyNormalizer {
    thresholds: Thresholds,
}

impl DailyNormalizer {
    pub fn new() -> Self {
        Self {
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Validate, flag and sort observations by (city_id, date).
    ///
    /// The first invalid row or repeated `(city_id, date)` key fails the
    /// whole batch; nothing is dropped or deduplicated.
    pub fn normalize(&self, observations: Vec<DailyObservation>) -> Result<Vec<DailyObservation>> {
        let mut seen = HashSet::with_capacity(observations.len());
        let mut normalized = Vec::with_capacity(observations.len());

        for mut observation in observations {
            if !seen.insert(observation.key()) {
                return Err(ProcessingError::DuplicateKey {
                    city_id: observation.city_id,
                    date: observation.date,
                });
            }

            observation.validate_relationships()?;
            observation.flags = self.derive_flags(&observation);
            normalized.push(observation);
        }

        normalized.sort_by(|a, b| {
            a.city_id
                .cmp(&b.city_id)
                .then_with(|| a.date.cmp(&b.date))
        });

        debug!(rows = normalized.len(), "normalized daily observations");
        Ok(normalized)
    }

    pub fn derive_flags(&self, observation: &DailyObservation) -> DayFlags {
        let t = &self.thresholds;
        DayFlags {
            is_heat_day: observation.tmax.is_some_and(|v| v >= t.heat_day_tmax),
            is_tropical_night: observation.tmin.is_some_and(|v| v >= t.tropical_night_tmin),
            is_heavy_precip_day: observation.precip_mm.is_some_and(|v| v >= t.heavy_precip_mm),
            is_summer_day: observation.tmax.is_some_and(|v| v >= t.summer_day_tmax),
        }
    }
}

impl Default for DailyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
