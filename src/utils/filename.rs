use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Default output directory: output/climate-anomaly-{YYMMDD}
pub fn generate_default_output_dir() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let dirname = format!("climate-anomaly-{:02}{:02}{:02}", year, month, day);
    PathBuf::from("output").join(dirname)
}

/// Path of a dataset's Parquet file inside the output directory
pub fn dataset_path(output_dir: &Path, dataset: &str) -> PathBuf {
    output_dir.join(format!("{}.parquet", dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::FEATURE_DATASET;

    #[test]
    fn test_generate_default_output_dir() {
        let dir = generate_default_output_dir();
        let dir_str = dir.to_string_lossy();

        let parts: Vec<&str> = dir_str.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "output");
        assert!(parts[1].starts_with("climate-anomaly-"));
        assert_eq!(parts[1].len(), "climate-anomaly-".len() + 6);
    }

    #[test]
    fn test_dataset_path() {
        let path = dataset_path(Path::new("out"), FEATURE_DATASET);
        assert_eq!(path, PathBuf::from("out/ml_features.parquet"));
    }
}
