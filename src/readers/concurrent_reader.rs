use crate::error::{ProcessingError, Result};
use crate::models::{CityMetadata, DailyObservation};
use crate::readers::{CityReader, ObservationReader};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Raw inputs of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    pub cities: BTreeMap<u32, CityMetadata>,
    pub observations: Vec<DailyObservation>,
}

impl InputData {
    /// Fail if any observation refers to a city missing from the registry.
    /// An empty registry disables the check.
    pub fn check_city_references(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Ok(());
        }
        match self
            .observations
            .iter()
            .find(|o| !self.cities.contains_key(&o.city_id))
        {
            Some(orphan) => Err(ProcessingError::CityNotFound {
                city_id: orphan.city_id,
            }),
            None => Ok(()),
        }
    }
}

pub struct ConcurrentReader {
    max_workers: usize,
}

impl ConcurrentReader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Read the observations and, when given, the city registry concurrently
    pub async fn read_all(&self, input: &Path, cities: Option<&Path>) -> Result<InputData> {
        let cities_handle: JoinHandle<Result<BTreeMap<u32, CityMetadata>>> = match cities {
            Some(path) => {
                let path = path.to_path_buf();
                tokio::task::spawn_blocking(move || CityReader::new().read_cities_map(&path))
            }
            None => tokio::spawn(async { Ok(BTreeMap::new()) }),
        };

        let observations = self.read_observations(input).await?;
        let cities = cities_handle.await??;

        let data = InputData {
            cities,
            observations,
        };
        data.check_city_references()?;
        Ok(data)
    }

    /// Read one CSV file, or every `*.csv` file of a directory in parallel
    pub async fn read_observations(&self, input: &Path) -> Result<Vec<DailyObservation>> {
        let files = Self::find_observation_files(input)?;
        if files.is_empty() {
            warn!(input = %input.display(), "no observation files found");
            return Ok(Vec::new());
        }

        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut handles: Vec<JoinHandle<Result<Vec<DailyObservation>>>> =
            Vec::with_capacity(files.len());

        for path in files {
            let permits = permits.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ProcessingError::Config(e.to_string()))?;
                tokio::task::spawn_blocking(move || -> Result<Vec<DailyObservation>> {
                    let rows = ObservationReader::new().read_observations(&path)?;
                    debug!(file = %path.display(), rows = rows.len(), "read observation file");
                    Ok(rows)
                })
                .await?
            }));
        }

        // Joined in file order so the output is deterministic
        let mut observations = Vec::new();
        for handle in handles {
            observations.extend(handle.await??);
        }
        Ok(observations)
    }

    fn find_observation_files(input: &Path) -> Result<Vec<PathBuf>> {
        if input.is_file() {
            return Ok(vec![input.to_path_buf()]);
        }
        if !input.is_dir() {
            return Err(ProcessingError::MissingData(format!(
                "Input path does not exist: {}",
                input.display()
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(input)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
