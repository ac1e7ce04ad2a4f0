// projeto: lstmfit
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
use std::time::Instant;
use thiserror::Error;

use neural::config::FitParams;
use neural::data::{MinMaxScaler, create_batches, load_series, window_split};
use neural::metrics::{TrainingMetrics, calculate_mape, calculate_rmse};
use neural::model::MultiLayerLSTM;
use neural::storage::{save_model, write_ok_sentinel};

#[derive(Error, Debug)]
pub enum FitError {
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
    #[error("Training error: {0}")]
    Training(String),
}

#[derive(Parser)]
#[command(name = "lstmfit", about = "Fit a recurrent model over a windowed time series", version = "0.1.0")]
struct Cli {
    #[arg(long, default_value = ".", help = "Artifact directory holding params.yaml, logs and outputs")]
    artifact_dir: PathBuf,
    #[arg(long, default_value = "params.yaml", help = "Parameter file name inside the artifact directory")]
    params_file: String,
}

fn fit(cli: &Cli) -> Result<(), FitError> {
    let start_time = Instant::now();
    println!("🚀 Starting fit run in {}", cli.artifact_dir.display());

    let params = FitParams::load(&cli.artifact_dir.join(&cli.params_file))?;
    params.validate()?;

    info!("Hyper params for experiment {}:", params.experiment_id);
    for (key, value) in &params.hyper_params {
        info!("  {}: {}", key, value);
    }

    let series = load_series(&params.dataset_path, params.value_column)?;
    info!("📥 Loaded {} rows from {}", series.len(), params.dataset_path.display());

    let scaler = if params.apply_scaler {
        MinMaxScaler::fit(&series)?
    } else {
        MinMaxScaler::identity()
    };
    let scaled = scaler.transform(&series);
    info!("📊 Scaler bounds - min: {:.4}, max: {:.4}", scaler.min, scaler.max);

    let split = window_split(&scaled, params.time_steps, params.batch_size, params.train_split)?;
    info!(
        "📊 Windowing: L={}, shift={}, effective_count={}",
        scaled.len(),
        split.shift,
        split.effective_count
    );
    println!(
        "🧠 Training: {} windows, Validation: {} windows",
        split.x_train.len(),
        split.x_test.len()
    );

    let mut rng = rand::rng();
    let mut model = MultiLayerLSTM::new(
        params.hidden_size,
        params.num_layers,
        params.dropout_rate,
        &mut rng,
    );

    let mut best_val_loss = f32::INFINITY;
    let mut final_loss = 0.0;
    let mut epochs_trained = 0;

    for epoch in 0..params.epochs {
        let batches = create_batches(&split.x_train, &split.y_train, params.batch_size);
        let mut epoch_loss: f32 = 0.0;
        for (batch_x, batch_y) in &batches {
            epoch_loss += model.train_step(batch_x, batch_y, params.learning_rate);
        }
        epoch_loss /= batches.len().max(1) as f32;

        let mut val_loss = 0.0;
        for (window, &target) in split.x_test.iter().zip(split.y_test.iter()) {
            let pred = model.forward(window, false);
            val_loss += (pred - target).powi(2);
        }
        val_loss /= split.x_test.len().max(1) as f32;

        if epoch_loss.is_nan() || epoch_loss > 1e6 {
            return Err(FitError::Training(format!(
                "Training diverged at epoch {} (loss: {})",
                epoch + 1,
                epoch_loss
            )));
        }

        if val_loss < best_val_loss {
            best_val_loss = val_loss;
        }
        final_loss = epoch_loss;
        epochs_trained = epoch + 1;

        if epoch % 10 == 0 || epoch < 5 {
            println!(
                "Epoch {:3}: Train Loss: {:.6}, Val Loss: {:.6}",
                epoch + 1,
                epoch_loss,
                val_loss
            );
        }
    }

    let mut val_predictions = Vec::with_capacity(split.x_test.len());
    for window in &split.x_test {
        val_predictions.push(model.forward(window, false));
    }
    let rmse = calculate_rmse(&val_predictions, &split.y_test);
    let mape = calculate_mape(&val_predictions, &split.y_test);

    let metrics = TrainingMetrics {
        final_loss,
        final_val_loss: best_val_loss,
        rmse,
        mape,
        epochs_trained,
        training_time: start_time.elapsed().as_secs_f64(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let weights = model.to_weights(&params, &scaler, metrics);
    save_model(&params.model_path, &weights)?;
    info!("💾 Model saved to {}", params.model_path.display());

    write_ok_sentinel(&params.output_resource_absolute_path)?;
    info!("✅ Ok sentinel written to {}", params.output_resource_absolute_path.display());

    println!("\n✅ Fit completed!");
    println!("   🎯 Train Loss: {:.6}", final_loss);
    println!("   🎯 Best Val Loss: {:.6}", best_val_loss);
    println!("   📏 Val RMSE: {:.4}", rmse);
    println!("   📊 Val MAPE: {:.2}%", mape * 100.0);
    println!("   ⏱️ Training Time: {:.1}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.artifact_dir)?;
    logging::init(&cli.artifact_dir.join("fit.log"))?;

    fit(&cli).map_err(|e| {
        error!("Fit failed: {}", e);
        Box::new(e) as Box<dyn std::error::Error>
    })
}

// cd lstmfit
// cargo run --release -- --artifact-dir ../demos/fit
