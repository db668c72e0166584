use serde::{Deserialize, Serialize};
use validator::Validate;

/// A city from the registry. `city_id` is the join key for every dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CityMetadata {
    #[validate(range(min = 1))]
    pub city_id: u32,

    #[validate(length(min = 1))]
    pub city_name: String,

    #[validate(length(min = 2, max = 3))]
    pub country_code: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default)]
    pub timezone: Option<String>,
}

impl CityMetadata {
    pub fn new(
        city_id: u32,
        city_name: String,
        country_code: String,
        latitude: f64,
        longitude: f64,
        timezone: Option<String>,
    ) -> Self {
        Self {
            city_id,
            city_name,
            country_code,
            latitude,
            longitude,
            timezone,
        }
    }

    /// Human-readable label, e.g. `Lisbon (PT)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.city_name, self.country_code.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_validation() {
        let city = CityMetadata::new(
            1,
            "Lisbon".to_string(),
            "PT".to_string(),
            38.7167,
            -9.1333,
            Some("Europe/Lisbon".to_string()),
        );

        assert!(city.validate().is_ok());
        assert_eq!(city.label(), "Lisbon (PT)");
    }

    #[test]
    fn test_invalid_city() {
        let zero_id = CityMetadata::new(0, "Nowhere".to_string(), "US".to_string(), 0.0, 0.0, None);
        assert!(zero_id.validate().is_err());

        let bad_lat = CityMetadata::new(
            2,
            "Sacramento".to_string(),
            "US".to_string(),
            91.0,
            -121.49,
            None,
        );
        assert!(bad_lat.validate().is_err());
    }
}
