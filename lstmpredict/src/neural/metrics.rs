// projeto: lstmpredict
// file: src/neural/metrics.rs

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::PredictError;

// Training metrics carried inside the model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub final_loss: f32,
    pub final_val_loss: f32,
    pub rmse: f32,
    pub mape: f32,
    pub epochs_trained: usize,
    pub training_time: f64,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsFile {
    pub values: MetricValues,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricValues {
    pub sum: i64,
}

// A synthetic demonstration value, not a computed metric
pub fn write_metrics(path: &Path) -> Result<i64, PredictError> {
    let sum = rand::rng().random_range(0..=10_000);
    let metrics = MetricsFile {
        values: MetricValues { sum },
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_yaml::to_string(&metrics)?)?;
    info!("Metrics file written to {}", path.display());
    Ok(sum)
}

pub fn read_metrics(path: &Path) -> Result<MetricsFile, PredictError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.yaml");
        let sum = write_metrics(&path).unwrap();

        let parsed = read_metrics(&path).unwrap();
        assert_eq!(parsed.values.sum, sum);
        assert!((0..=10_000).contains(&parsed.values.sum));
    }

    #[test]
    fn test_metrics_file_has_nested_values_sum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.yaml");
        write_metrics(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("values:"));
        assert!(raw.contains("sum:"));
    }
}
