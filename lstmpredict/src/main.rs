// projeto: lstmpredict
// file: src/main.rs

mod logging;

mod neural {
    pub mod config;
    pub mod data;
    pub mod metrics;
    pub mod model;
    pub mod storage;
}

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use thiserror::Error;

use neural::config::PredictParams;
use neural::data::{MinMaxScaler, last_window, load_series};
use neural::metrics::write_metrics;
use neural::model::MultiLayerLSTM;
use neural::storage::{load_model, write_ok_sentinel, write_predictions};

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Data error: {0}")]
    Data(String),
    #[error("Model error: {0}")]
    Model(String),
}

#[derive(Parser)]
#[command(name = "lstmpredict", about = "Run predictions with a previously fitted recurrent model", version = "0.1.0")]
struct Cli {
    #[arg(long, default_value = ".", help = "Artifact directory holding params.yaml, logs and outputs")]
    artifact_dir: PathBuf,
    #[arg(long, default_value = "params.yaml", help = "Parameter file name inside the artifact directory")]
    params_file: String,
}

fn predict(cli: &Cli) -> Result<(), PredictError> {
    println!("🔮 Starting predict run in {}", cli.artifact_dir.display());

    let params = PredictParams::load(&cli.artifact_dir.join(&cli.params_file))?;
    params.validate()?;

    info!("Hyper params for experiment {}:", params.experiment_id);
    for (key, value) in &params.hyper_params {
        info!("  {}: {}", key, value);
    }

    let weights = load_model(&params.model_path)?;
    info!(
        "🏗️ Model loaded from {} ({} layers, {} hidden units)",
        params.model_path.display(),
        weights.num_layers,
        weights.hidden_size
    );
    info!(
        "   Fitted for experiment {} at {} (val RMSE {:.4}, {} epochs)",
        weights.experiment_id,
        weights.timestamp,
        weights.metrics.rmse,
        weights.metrics.epochs_trained
    );
    let scaler = MinMaxScaler {
        min: weights.series_min,
        max: weights.series_max,
    };
    let time_steps = weights.time_steps;
    let model = MultiLayerLSTM::from_weights(weights)?;

    let series = load_series(&params.dataset_path, params.value_column)?;
    info!("📥 Loaded {} rows from {}", series.len(), params.dataset_path.display());

    let scaled = scaler.transform(&series);
    let mut window = last_window(&scaled, time_steps)?;

    let mut predictions = Vec::with_capacity(params.num_predictions);
    for step in 0..params.num_predictions {
        let normalized = model.forward(&window, false);
        let value = scaler.inverse(normalized);
        predictions.push((step + 1, value));
        info!("🔮 Prediction {}/{}: {:.4}", step + 1, params.num_predictions, value);

        // feed the prediction back as the newest point
        window.remove(0);
        window.push(normalized);
    }

    write_predictions(&params.prediction_path, &predictions)?;
    info!("💾 Predictions written to {}", params.prediction_path.display());

    let sum = write_metrics(&params.metrics_path)?;
    info!("📊 Metrics written to {} (values.sum: {})", params.metrics_path.display(), sum);

    write_ok_sentinel(&params.output_resource_absolute_path)?;
    info!("✅ Ok sentinel written to {}", params.output_resource_absolute_path.display());

    info!("🕒 Run finished at {}", chrono::Utc::now().to_rfc3339());

    println!("\n✅ Predict completed!");
    println!("   🔢 Steps predicted: {}", predictions.len());
    for (step, value) in &predictions {
        println!("      Step {}: {:.4}", step, value);
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.artifact_dir)?;
    logging::init(&cli.artifact_dir.join("predict.log"))?;

    predict(&cli).map_err(|e| {
        error!("Predict failed: {}", e);
        Box::new(e) as Box<dyn std::error::Error>
    })
}

// cd lstmpredict
// cargo run --release -- --artifact-dir ../demos/predict
