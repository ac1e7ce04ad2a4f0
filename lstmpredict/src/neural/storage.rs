// projeto: lstmpredict
// file: src/neural/storage.rs

use log::info;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::PredictError;
use crate::neural::model::ModelWeights;

pub fn load_model(path: &Path) -> Result<ModelWeights, PredictError> {
    let json = fs::read_to_string(path)
        .map_err(|e| PredictError::Model(format!("Cannot read model {}: {}", path.display(), e)))?;
    let weights: ModelWeights = serde_json::from_str(&json)?;
    info!("Model weights loaded from {}", path.display());
    Ok(weights)
}

pub fn write_predictions(path: &Path, predictions: &[(usize, f32)]) -> Result<(), PredictError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut out = fs::File::create(path)?;
    writeln!(out, "step,value")?;
    for (step, value) in predictions {
        writeln!(out, "{},{}", step, value)?;
    }
    Ok(())
}

// The two-character success marker consumed by the caller of the script
pub fn write_ok_sentinel(path: &Path) -> Result<(), PredictError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, "Ok")?;
    Ok(())
}
