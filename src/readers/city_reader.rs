use crate::error::{ProcessingError, Result};
use crate::models::CityMetadata;
use std::collections::BTreeMap;
use std::path::Path;
use validator::Validate;

/// Reads the city registry CSV
/// (`city_id,city_name,country_code,latitude,longitude,timezone`).
pub struct CityReader;

impl CityReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_cities(&self, path: &Path) -> Result<Vec<CityMetadata>> {
        let file = std::fs::File::open(path)?;
        self.read_from(file)
    }

    pub fn read_from<R: std::io::Read>(&self, source: R) -> Result<Vec<CityMetadata>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut cities = Vec::new();
        for row in reader.deserialize::<CityMetadata>() {
            let mut city = row?;
            if city.timezone.as_deref().is_some_and(str::is_empty) {
                city.timezone = None;
            }
            city.validate()?;
            cities.push(city);
        }
        Ok(cities)
    }

    /// Registry keyed by `city_id`; a repeated id is an error
    pub fn read_cities_map(&self, path: &Path) -> Result<BTreeMap<u32, CityMetadata>> {
        let mut map = BTreeMap::new();
        for city in self.read_cities(path)? {
            let city_id = city.city_id;
            if map.insert(city_id, city).is_some() {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Duplicate city_id {} in {}",
                    city_id,
                    path.display()
                )));
            }
        }
        Ok(map)
    }
}

impl Default for CityReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_registry() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "city_id,city_name,country_code,latitude,longitude,timezone")?;
        writeln!(file, "1,Lisbon,PT,38.7167,-9.1333,Europe/Lisbon")?;
        writeln!(file, "2,Sacramento,US,38.5816,-121.4944,")?;

        let cities = CityReader::new().read_cities_map(file.path())?;
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[&1].label(), "Lisbon (PT)");
        assert_eq!(cities[&2].timezone, None);
        Ok(())
    }

    #[test]
    fn test_duplicate_city_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "city_id,city_name,country_code,latitude,longitude,timezone").unwrap();
        writeln!(file, "1,Lisbon,PT,38.7,-9.1,").unwrap();
        writeln!(file, "1,Porto,PT,41.1,-8.6,").unwrap();

        let result = CityReader::new().read_cities_map(file.path());
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let data = "city_id,city_name,country_code,latitude,longitude,timezone\n3,Nowhere,XX,95.0,0.0,\n";
        let result = CityReader::new().read_from(data.as_bytes());
        assert!(matches!(result, Err(ProcessingError::Validation(_))));
    }
}
