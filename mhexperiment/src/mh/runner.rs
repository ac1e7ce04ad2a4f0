// projeto: mhexperiment
// file: src/mh/runner.rs
// Turns an experiment into sequences and runs their snippet chains

use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::MhError;
use crate::mh::exec::{ExecResult, exec_snippet};
use crate::mh::experiment::{EnvManifest, Experiment, SnippetKind};
use crate::mh::permute::{HyperAssignment, permutations};

const METRICS_FILE_NAME: &str = "metrics.yaml";
const PARAMS_FILE_NAME: &str = "params.yaml";

#[derive(Debug, Clone)]
pub enum MetricsStatus {
    Ok { raw: String },
    NotFound,
    Error { message: String },
}

#[derive(Debug)]
pub struct SnippetExecRecord {
    pub order: u32,
    pub code: String,
    pub result: ExecResult,
}

#[derive(Debug)]
pub struct SequenceReport {
    pub sequence_id: u64,
    pub hyper_path: String,
    pub execs: Vec<SnippetExecRecord>,
    pub metrics: MetricsStatus,
    pub finished: bool,
    pub launched_at: String,
    pub finished_at: String,
}

// One concrete hyper-param assignment with its place on disk
#[derive(Debug)]
pub struct ExperimentSequence {
    pub sequence_id: u64,
    pub assignment: HyperAssignment,
    pub sequence_dir: PathBuf,
    pub artifact_dir: PathBuf,
}

fn prepare_sequences(
    experiment_id: u64,
    assignments: Vec<HyperAssignment>,
    station_dir: &Path,
) -> Vec<ExperimentSequence> {
    assignments
        .into_iter()
        .enumerate()
        .map(|(idx, assignment)| {
            let sequence_id = idx as u64 + 1;
            let sequence_dir = station_dir
                .join("experiment")
                .join(format!("{:06}", experiment_id))
                .join("sequence")
                .join(format!("{:06}", sequence_id));
            let artifact_dir = sequence_dir.join("artifacts");
            ExperimentSequence {
                sequence_id,
                assignment,
                sequence_dir,
                artifact_dir,
            }
        })
        .collect()
}

// The params.yaml handed to each snippet. Keys mirror what the fit and
// predict scripts read; recognized hyper-param keys are lifted into the
// matching knob fields, the full assignment rides along in hyperParams.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SequenceParams {
    experiment_id: u64,
    sequence_id: u64,
    dataset_path: String,
    artifact_path: String,
    model_path: String,
    prediction_path: String,
    metrics_path: String,
    output_resource_absolute_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_steps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    epochs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hidden_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_layers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predictions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    learning_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    train_split: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    inputs: BTreeMap<String, String>,
    hyper_params: BTreeMap<String, String>,
}

pub fn exec_experiment(
    experiment: &Experiment,
    env: &EnvManifest,
    station_dir: &Path,
    experiment_id: u64,
) -> Result<Vec<SequenceReport>, MhError> {
    experiment.validate()?;

    let dataset_path = prepare_asset(station_dir, &experiment.dataset_path)
        .ok_or_else(|| MhError::Config(format!(
            "Dataset hasn't been prepared yet: {}",
            experiment.dataset_path.display()
        )))?;

    let mut inputs = BTreeMap::new();
    for variable in &experiment.variables {
        for (key, value) in &variable.inputs {
            let path = prepare_asset(station_dir, Path::new(value)).ok_or_else(|| {
                MhError::Config(format!(
                    "Input '{}' of variable '{}' hasn't been prepared yet: {}",
                    key, variable.name, value
                ))
            })?;
            inputs.insert(
                format!("{}.{}", variable.name, key),
                path.display().to_string(),
            );
        }
    }

    // interpreters and snippet files are shared by every sequence; resolve
    // them once up front
    let snippets = experiment.snippets_in_order();
    let mut resolved = Vec::with_capacity(snippets.len());
    for snippet in &snippets {
        let interpreter = env.interpreter(&snippet.env)?.to_string();
        let file = prepare_asset(station_dir, &snippet.filename).ok_or_else(|| {
            MhError::Config(format!(
                "Snippet file wasn't found: {}",
                snippet.filename.display()
            ))
        })?;
        resolved.push(((*snippet).clone(), interpreter, file));
    }

    let assignments = permutations(&experiment.hyper_params)?;
    let sequences = prepare_sequences(experiment_id, assignments, station_dir);
    info!(
        "🧮 Experiment '{}' produced {} sequences",
        experiment.name,
        sequences.len()
    );

    let mut reports = Vec::with_capacity(sequences.len());
    for sequence in &sequences {
        let report = exec_sequence(experiment_id, sequence, &resolved, &dataset_path, &inputs)?;
        reports.push(report);
    }

    Ok(reports)
}

fn exec_sequence(
    experiment_id: u64,
    sequence: &ExperimentSequence,
    snippets: &[(crate::mh::experiment::Snippet, String, PathBuf)],
    dataset_path: &Path,
    inputs: &BTreeMap<String, String>,
) -> Result<SequenceReport, MhError> {
    let sequence_id = sequence.sequence_id;
    let assignment = &sequence.assignment;
    let sequence_dir = &sequence.sequence_dir;
    let artifact_dir = &sequence.artifact_dir;
    fs::create_dir_all(artifact_dir)?;
    let launched_at = chrono::Utc::now().to_rfc3339();

    let mut execs = Vec::new();
    let mut metrics = MetricsStatus::NotFound;
    let mut all_ok = true;

    for (snippet, interpreter, snippet_file) in snippets {
        let kind_dir = sequence_dir.join(snippet.kind.as_str());
        fs::create_dir_all(&kind_dir)?;

        let params = sequence_params(
            experiment_id,
            sequence_id,
            snippet.kind,
            assignment,
            dataset_path,
            inputs,
            artifact_dir,
        );
        fs::write(kind_dir.join(PARAMS_FILE_NAME), serde_yaml::to_string(&params)?)?;

        let result = exec_snippet(interpreter, snippet_file, &kind_dir)?;
        let ok = result.ok;
        info!(
            "Sequence {:06}: snippet {} (order {}) finished, ok: {}",
            sequence_id, snippet.code, snippet.order, ok
        );
        if snippet.kind == SnippetKind::Predict && ok {
            metrics = collect_metrics(artifact_dir);
        }
        execs.push(SnippetExecRecord {
            order: snippet.order,
            code: snippet.code.clone(),
            result,
        });

        if !ok {
            // the rest of the chain is not run
            let last = execs.last().map(|e| e.result.console.as_str()).unwrap_or("");
            warn!(
                "Sequence {:06}: snippet {} failed, stopping the chain. Console:\n{}",
                sequence_id, snippet.code, last
            );
            all_ok = false;
            break;
        }
    }

    let finished = all_ok && execs.len() == snippets.len();
    Ok(SequenceReport {
        sequence_id,
        hyper_path: assignment.path.clone(),
        execs,
        metrics,
        finished,
        launched_at,
        finished_at: chrono::Utc::now().to_rfc3339(),
    })
}

fn sequence_params(
    experiment_id: u64,
    sequence_id: u64,
    kind: SnippetKind,
    assignment: &HyperAssignment,
    dataset_path: &Path,
    inputs: &BTreeMap<String, String>,
    artifact_dir: &Path,
) -> SequenceParams {
    let hyper_params: BTreeMap<String, String> = assignment.params.iter().cloned().collect();
    let int_knob = |key: &str| hyper_params.get(key).and_then(|v| v.parse::<u64>().ok());
    let float_knob = |key: &str| hyper_params.get(key).and_then(|v| v.parse::<f64>().ok());

    SequenceParams {
        experiment_id,
        sequence_id,
        dataset_path: dataset_path.display().to_string(),
        artifact_path: artifact_dir.display().to_string(),
        model_path: artifact_dir.join("model.json").display().to_string(),
        prediction_path: artifact_dir.join("prediction.csv").display().to_string(),
        metrics_path: artifact_dir.join(METRICS_FILE_NAME).display().to_string(),
        output_resource_absolute_path: artifact_dir
            .join(format!("ok-{}.txt", kind.as_str()))
            .display()
            .to_string(),
        time_steps: int_knob("timeSteps"),
        batch_size: int_knob("batchSize"),
        epochs: int_knob("epochs"),
        hidden_size: int_knob("hiddenSize"),
        num_layers: int_knob("numLayers"),
        num_predictions: int_knob("numPredictions"),
        learning_rate: float_knob("learningRate"),
        train_split: float_knob("trainSplit"),
        inputs: inputs.clone(),
        hyper_params,
    }
}

fn collect_metrics(artifact_dir: &Path) -> MetricsStatus {
    let metrics_file = artifact_dir.join(METRICS_FILE_NAME);
    if !metrics_file.exists() {
        return MetricsStatus::NotFound;
    }
    match fs::read_to_string(&metrics_file) {
        Ok(raw) => MetricsStatus::Ok { raw },
        Err(e) => MetricsStatus::Error {
            message: format!("Error reading metrics file {}: {}", metrics_file.display(), e),
        },
    }
}

// Resolves an asset path against the station dir and checks it is in place
fn prepare_asset(station_dir: &Path, path: &Path) -> Option<PathBuf> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        station_dir.join(path)
    };
    fs::canonicalize(&full).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mh::experiment::{HyperParam, Snippet, Variable};

    fn write_station(dir: &Path) {
        fs::create_dir_all(dir.join("snippets")).unwrap();
        fs::write(dir.join("series.csv"), "value\n1\n2\n3\n").unwrap();
    }

    fn shell_env() -> EnvManifest {
        let mut env = EnvManifest::default();
        env.envs.insert("shell".to_string(), "sh".to_string());
        env
    }

    fn fit_snippet(filename: &str) -> Snippet {
        Snippet {
            code: "fit:1.0".to_string(),
            kind: SnippetKind::Fit,
            filename: PathBuf::from(filename),
            env: "shell".to_string(),
            order: 1,
        }
    }

    fn predict_snippet(filename: &str) -> Snippet {
        Snippet {
            code: "predict:1.0".to_string(),
            kind: SnippetKind::Predict,
            filename: PathBuf::from(filename),
            env: "shell".to_string(),
            order: 2,
        }
    }

    fn experiment(snippets: Vec<Snippet>, hyper_params: Vec<HyperParam>) -> Experiment {
        Experiment {
            name: "test".to_string(),
            dataset_path: PathBuf::from("series.csv"),
            variables: Vec::new(),
            hyper_params,
            snippets,
        }
    }

    #[test]
    fn test_exec_experiment_runs_one_sequence_per_permutation() {
        let dir = tempfile::tempdir().unwrap();
        write_station(dir.path());
        fs::write(dir.path().join("snippets/fit.sh"), "cat params.yaml\n").unwrap();

        let exp = experiment(
            vec![fit_snippet("snippets/fit.sh")],
            vec![HyperParam {
                key: "epochs".to_string(),
                values: "[10, 20]".to_string(),
            }],
        );
        let reports = exec_experiment(&exp, &shell_env(), dir.path(), 1).unwrap();

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert!(report.finished);
            assert_eq!(report.execs.len(), 1);
            assert!(report.execs[0].result.ok);
            // the snippet saw its params.yaml with the lifted knob
            assert!(report.execs[0].result.console.contains("epochs:"));
            assert!(matches!(report.metrics, MetricsStatus::NotFound));
        }
        assert!(dir
            .path()
            .join("experiment/000001/sequence/000002/fit/params.yaml")
            .exists());
        assert!(dir.path().join("experiment/000001/sequence/000001/artifacts").exists());
    }

    #[test]
    fn test_exec_experiment_stops_chain_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_station(dir.path());
        fs::write(dir.path().join("snippets/fit.sh"), "exit 1\n").unwrap();
        fs::write(dir.path().join("snippets/predict.sh"), "echo never\n").unwrap();

        let exp = experiment(
            vec![fit_snippet("snippets/fit.sh"), predict_snippet("snippets/predict.sh")],
            Vec::new(),
        );
        let reports = exec_experiment(&exp, &shell_env(), dir.path(), 1).unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert!(!report.finished);
        // the predict snippet was never run
        assert_eq!(report.execs.len(), 1);
        assert!(!report.execs[0].result.ok);
    }

    #[test]
    fn test_exec_experiment_collects_metrics_after_predict() {
        let dir = tempfile::tempdir().unwrap();
        write_station(dir.path());
        fs::write(dir.path().join("snippets/fit.sh"), "exit 0\n").unwrap();
        fs::write(
            dir.path().join("snippets/predict.sh"),
            "printf 'values:\\n  sum: 42\\n' > ../artifacts/metrics.yaml\n",
        )
        .unwrap();

        let exp = experiment(
            vec![fit_snippet("snippets/fit.sh"), predict_snippet("snippets/predict.sh")],
            Vec::new(),
        );
        let reports = exec_experiment(&exp, &shell_env(), dir.path(), 1).unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert!(report.finished);
        match &report.metrics {
            MetricsStatus::Ok { raw } => assert!(raw.contains("sum: 42")),
            other => panic!("expected metrics Ok, got {:?}", other),
        }
    }

    #[test]
    fn test_exec_experiment_missing_dataset_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("snippets")).unwrap();
        fs::write(dir.path().join("snippets/fit.sh"), "exit 0\n").unwrap();

        let exp = experiment(vec![fit_snippet("snippets/fit.sh")], Vec::new());
        let result = exec_experiment(&exp, &shell_env(), dir.path(), 1);
        assert!(matches!(result, Err(MhError::Config(_))));
    }

    #[test]
    fn test_exec_experiment_checks_variable_inputs() {
        let dir = tempfile::tempdir().unwrap();
        write_station(dir.path());
        fs::write(dir.path().join("snippets/fit.sh"), "exit 0\n").unwrap();

        let mut exp = experiment(vec![fit_snippet("snippets/fit.sh")], Vec::new());
        let mut inputs = BTreeMap::new();
        inputs.insert("csv".to_string(), "missing/feature.csv".to_string());
        exp.variables.push(Variable {
            name: "feature".to_string(),
            inputs,
        });

        let result = exec_experiment(&exp, &shell_env(), dir.path(), 1);
        assert!(matches!(result, Err(MhError::Config(_))));
    }

    #[test]
    fn test_exec_experiment_missing_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        write_station(dir.path());
        fs::write(dir.path().join("snippets/fit.sh"), "exit 0\n").unwrap();

        let exp = experiment(vec![fit_snippet("snippets/fit.sh")], Vec::new());
        let result = exec_experiment(&exp, &EnvManifest::default(), dir.path(), 1);
        assert!(matches!(result, Err(MhError::InterpreterNotFound(_))));
    }
}
