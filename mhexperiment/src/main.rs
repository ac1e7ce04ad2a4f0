// projeto: mhexperiment
// file: src/main.rs

mod logging;

mod mh {
    pub mod exec;
    pub mod experiment;
    pub mod permute;
    pub mod runner;
}

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use thiserror::Error;

use mh::experiment::{EnvManifest, Experiment};
use mh::runner::{MetricsStatus, exec_experiment};

#[derive(Error, Debug)]
pub enum MhError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Wrong variants format for string: {0}")]
    Variants(String),
    #[error("Too many variants for string: {0}")]
    TooManyVariants(String),
    #[error("Interpreter wasn't found for env: {0}")]
    InterpreterNotFound(String),
    #[error("Exec error: {0}")]
    Exec(String),
}

#[derive(Parser)]
#[command(name = "mhexperiment", about = "Run an experiment: permute hyper params and chain fit/predict snippets", version = "0.1.0")]
struct Cli {
    #[arg(long, default_value = "experiment.yaml", help = "Experiment description file")]
    experiment_file: PathBuf,
    #[arg(long, default_value = "env.yaml", help = "Environment file mapping env keys to interpreters")]
    env_file: PathBuf,
    #[arg(long, default_value = ".", help = "Station directory where sequence artifacts are created")]
    station_dir: PathBuf,
    #[arg(long, default_value_t = 1, help = "Experiment id used in the directory layout")]
    experiment_id: u64,
}

fn run(cli: &Cli) -> Result<(), MhError> {
    let experiment = Experiment::load(&cli.experiment_file)?;
    let env = EnvManifest::load(&cli.env_file)?;
    info!("🧪 Experiment '{}' with {} snippets", experiment.name, experiment.snippets.len());

    let reports = exec_experiment(&experiment, &env, &cli.station_dir, cli.experiment_id)?;

    let finished = reports.iter().filter(|r| r.finished).count();
    println!("\n📊 Experiment '{}' summary:", experiment.name);
    println!("   🔢 Sequences: {} ({} finished)", reports.len(), finished);
    for report in &reports {
        let metrics = match &report.metrics {
            MetricsStatus::Ok { raw } => format!("metrics: Ok, {} bytes", raw.len()),
            MetricsStatus::NotFound => "metrics: NotFound".to_string(),
            MetricsStatus::Error { message } => format!("metrics: Error, {}", message),
        };
        println!(
            "      Sequence {:06}: {} snippets, {} [{}] ({} → {})",
            report.sequence_id,
            report.execs.len(),
            if report.finished { "✅" } else { "❌" },
            metrics,
            report.launched_at,
            report.finished_at
        );
        for exec in &report.execs {
            println!(
                "         snippet {} (order {}): exit code {:?}",
                exec.code, exec.order, exec.result.exit_code
            );
        }
        if !report.hyper_path.is_empty() {
            println!("         params: {}", report.hyper_path);
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.station_dir)?;
    logging::init(&cli.station_dir.join("experiment.log"))?;

    run(&cli).map_err(|e| {
        error!("Experiment failed: {}", e);
        Box::new(e) as Box<dyn std::error::Error>
    })
}

// cd mhexperiment
// cargo run --release -- --experiment-file ../demos/experiment.yaml --env-file ../demos/env.yaml --station-dir ../demos/station
