// projeto: reqcheck
// file: src/main.rs

mod logging;
mod report;

use clap::Parser;
use log::error;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use report::{build_report, parse_installed, parse_requirements};

#[derive(Error, Debug)]
pub enum ReqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Parser)]
#[command(name = "reqcheck", about = "Classify declared dependencies as satisfied, missing or version-conflicted", version = "0.1.0")]
struct Cli {
    #[arg(long, default_value = "requirements.txt", help = "Requirements list to check")]
    requirements: PathBuf,
    #[arg(long, default_value = "installed.txt", help = "Installed distributions in freeze format")]
    installed: PathBuf,
    #[arg(long, default_value = "reqcheck.log", help = "Log file mirroring standard output")]
    log_file: PathBuf,
}

fn check(cli: &Cli) -> Result<(), ReqError> {
    let requirements = parse_requirements(&fs::read_to_string(&cli.requirements)?)?;
    let installed = parse_installed(&fs::read_to_string(&cli.installed)?)?;

    let report = build_report(&requirements, &installed);
    report.print();
    Ok(())
}

// Every outcome is informational; the process never fails on a bucket
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_file)?;

    check(&cli).map_err(|e| {
        error!("Requirements check failed: {}", e);
        Box::new(e) as Box<dyn std::error::Error>
    })
}

// cd reqcheck
// cargo run --release -- --requirements ../demos/requirements.txt --installed ../demos/installed.txt
