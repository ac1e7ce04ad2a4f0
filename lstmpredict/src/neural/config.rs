// projeto: lstmpredict
// file: src/neural/config.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::PredictError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictParams {
    pub experiment_id: u64,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub prediction_path: PathBuf,
    pub metrics_path: PathBuf,
    pub output_resource_absolute_path: PathBuf,
    pub value_column: usize,
    pub num_predictions: usize,
    pub hyper_params: BTreeMap<String, String>,
}

impl Default for PredictParams {
    fn default() -> Self {
        Self {
            experiment_id: 0,
            dataset_path: PathBuf::from("dataset.csv"),
            model_path: PathBuf::from("model.json"),
            prediction_path: PathBuf::from("prediction.csv"),
            metrics_path: PathBuf::from("metrics.yaml"),
            output_resource_absolute_path: PathBuf::from("ok.txt"),
            value_column: 0,
            num_predictions: 5,
            hyper_params: BTreeMap::new(),
        }
    }
}

impl PredictParams {
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let content = fs::read_to_string(path)?;
        let params: PredictParams = serde_yaml::from_str(&content)?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err(PredictError::Config("datasetPath must not be empty".to_string()));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(PredictError::Config("modelPath must not be empty".to_string()));
        }
        if self.prediction_path.as_os_str().is_empty() {
            return Err(PredictError::Config("predictionPath must not be empty".to_string()));
        }
        if self.metrics_path.as_os_str().is_empty() {
            return Err(PredictError::Config("metricsPath must not be empty".to_string()));
        }
        if self.output_resource_absolute_path.as_os_str().is_empty() {
            return Err(PredictError::Config(
                "outputResourceAbsolutePath must not be empty".to_string(),
            ));
        }
        if self.num_predictions == 0 {
            return Err(PredictError::Config(
                "numPredictions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
