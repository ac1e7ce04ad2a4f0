// projeto: lstmfit
// file: src/neural/storage.rs

use log::info;
use std::fs;
use std::path::Path;

use crate::FitError;
use crate::neural::model::ModelWeights;

pub fn save_model(path: &Path, weights: &ModelWeights) -> Result<(), FitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string(weights)?;
    fs::write(path, json)?;
    info!("Model weights saved to {}", path.display());
    Ok(())
}

// The two-character success marker consumed by the caller of the script
pub fn write_ok_sentinel(path: &Path) -> Result<(), FitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, "Ok")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::config::FitParams;
    use crate::neural::data::MinMaxScaler;
    use crate::neural::metrics::TrainingMetrics;
    use crate::neural::model::MultiLayerLSTM;

    #[test]
    fn test_ok_sentinel_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts").join("ok.txt");
        write_ok_sentinel(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Ok");
        assert_eq!(content.len(), 2);
    }

    #[test]
    fn test_save_model_writes_parseable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut rng = rand::rng();
        let model = MultiLayerLSTM::new(4, 1, 0.0, &mut rng);
        let metrics = TrainingMetrics {
            final_loss: 0.0,
            final_val_loss: 0.0,
            rmse: 0.0,
            mape: 0.0,
            epochs_trained: 1,
            training_time: 0.0,
            timestamp: "t".to_string(),
        };
        let weights = model.to_weights(&FitParams::default(), &MinMaxScaler::identity(), metrics);
        save_model(&path, &weights).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        let parsed: crate::neural::model::ModelWeights = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.layers.len(), 1);
        assert_eq!(parsed.time_steps, weights.time_steps);
    }
}
