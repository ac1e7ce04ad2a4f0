// projeto: lstmfit
// file: src/neural/config.rs
// Leitura do params.yaml do diretório de artefatos

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::FitError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitParams {
    pub experiment_id: u64,
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub output_resource_absolute_path: PathBuf,
    pub apply_scaler: bool,
    pub value_column: usize,
    pub time_steps: usize,
    pub batch_size: usize,
    pub epochs: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dropout_rate: f32,
    pub learning_rate: f32,
    pub train_split: f32,
    pub hyper_params: BTreeMap<String, String>,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            experiment_id: 0,
            dataset_path: PathBuf::from("dataset.csv"),
            model_path: PathBuf::from("model.json"),
            output_resource_absolute_path: PathBuf::from("ok.txt"),
            apply_scaler: true,
            value_column: 0,
            time_steps: 20,
            batch_size: 16,
            epochs: 50,
            hidden_size: 32,
            num_layers: 1,
            dropout_rate: 0.0,
            learning_rate: 0.001,
            train_split: 0.8,
            hyper_params: BTreeMap::new(),
        }
    }
}

impl FitParams {
    pub fn load(path: &Path) -> Result<Self, FitError> {
        let content = fs::read_to_string(path)?;
        let params: FitParams = serde_yaml::from_str(&content)?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), FitError> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err(FitError::Config("datasetPath must not be empty".to_string()));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(FitError::Config("modelPath must not be empty".to_string()));
        }
        if self.output_resource_absolute_path.as_os_str().is_empty() {
            return Err(FitError::Config(
                "outputResourceAbsolutePath must not be empty".to_string(),
            ));
        }
        if self.time_steps == 0 {
            return Err(FitError::Config("timeSteps must be greater than zero".to_string()));
        }
        if self.batch_size == 0 {
            return Err(FitError::Config("batchSize must be greater than zero".to_string()));
        }
        if self.epochs == 0 {
            return Err(FitError::Config("epochs must be greater than zero".to_string()));
        }
        if self.hidden_size == 0 {
            return Err(FitError::Config("hiddenSize must be greater than zero".to_string()));
        }
        if self.num_layers == 0 {
            return Err(FitError::Config("numLayers must be greater than zero".to_string()));
        }
        if self.learning_rate <= 0.0 {
            return Err(FitError::Config("learningRate must be positive".to_string()));
        }
        if !(self.train_split > 0.0 && self.train_split < 1.0) {
            return Err(FitError::Config(
                "trainSplit must be between 0.0 and 1.0 exclusive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(FitError::Config("dropoutRate must be in [0.0, 1.0)".to_string()));
        }
        Ok(())
    }
}
