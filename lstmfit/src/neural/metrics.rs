// projeto: lstmfit
// file: src/neural/metrics.rs

use serde::{Deserialize, Serialize};

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

pub fn calculate_rmse(predictions: &[f32], targets: &[f32]) -> f32 {
    let n = predictions.len().max(1) as f32;
    (predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f32>()
        / n)
        .sqrt()
}

pub fn calculate_mape(predictions: &[f32], targets: &[f32]) -> f32 {
    let n = predictions.len().max(1) as f32;
    predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).abs() / t.abs().max(1e-8))
        .sum::<f32>()
        / n
}
