// projeto: mhexperiment
// file: src/mh/experiment.rs
// Data model of the pipeline DSL: snippets, variables, experiments

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::MhError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetKind {
    Fit,
    Predict,
}

impl SnippetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetKind::Fit => "fit",
            SnippetKind::Predict => "predict",
        }
    }
}

// A named, versioned unit of executable logic
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub code: String,
    pub kind: SnippetKind,
    pub filename: PathBuf,
    pub env: String,
    #[serde(default)]
    pub order: u32,
}

// A named data container with an input mapping, the DSL's data-passing unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

// One hyper-param key and its variants expression; order in the list is
// the permutation order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperParam {
    pub key: String,
    pub values: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub name: String,
    pub dataset_path: PathBuf,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub hyper_params: Vec<HyperParam>,
    #[serde(default)]
    pub snippets: Vec<Snippet>,
}

impl Experiment {
    pub fn load(path: &Path) -> Result<Self, MhError> {
        let content = fs::read_to_string(path)?;
        let experiment: Experiment = serde_yaml::from_str(&content)?;
        experiment.validate()?;
        Ok(experiment)
    }

    pub fn validate(&self) -> Result<(), MhError> {
        if self.name.is_empty() {
            return Err(MhError::Config("Experiment name must not be empty".to_string()));
        }
        if self.dataset_path.as_os_str().is_empty() {
            return Err(MhError::Config("datasetPath must not be empty".to_string()));
        }
        if self.snippets.is_empty() {
            return Err(MhError::Config(
                "Broken experiment. List of snippets is empty".to_string(),
            ));
        }
        for variable in &self.variables {
            if variable.name.is_empty() {
                return Err(MhError::Config("Variable with empty name".to_string()));
            }
        }
        Ok(())
    }

    pub fn snippets_in_order(&self) -> Vec<&Snippet> {
        let mut snippets: Vec<&Snippet> = self.snippets.iter().collect();
        snippets.sort_by_key(|s| s.order);
        snippets
    }
}

// env key -> interpreter command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvManifest {
    #[serde(default)]
    pub envs: BTreeMap<String, String>,
}

impl EnvManifest {
    pub fn load(path: &Path) -> Result<Self, MhError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn interpreter(&self, env: &str) -> Result<&str, MhError> {
        self.envs
            .get(env)
            .map(String::as_str)
            .ok_or_else(|| MhError::InterpreterNotFound(env.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        "\
name: window-sweep
datasetPath: data/series.csv
variables:
  - name: dataset
    inputs:
      csv: data/series.csv
hyperParams:
  - key: epochs
    values: '[10, 20]'
  - key: hiddenSize
    values: 'Range(32, 96, 32)'
snippets:
  - code: 'fit:1.0'
    kind: fit
    filename: snippets/fit.sh
    env: shell
    order: 1
  - code: 'predict:1.0'
    kind: predict
    filename: snippets/predict.sh
    env: shell
    order: 2
"
    }

    #[test]
    fn test_parse_experiment_yaml() {
        let experiment: Experiment = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(experiment.name, "window-sweep");
        assert_eq!(experiment.hyper_params.len(), 2);
        assert_eq!(experiment.hyper_params[0].key, "epochs");
        assert_eq!(experiment.snippets.len(), 2);
        assert_eq!(experiment.snippets[0].kind, SnippetKind::Fit);
        assert_eq!(experiment.snippets[1].kind, SnippetKind::Predict);
        assert_eq!(experiment.variables[0].inputs.get("csv").map(String::as_str), Some("data/series.csv"));
        assert!(experiment.validate().is_ok());
    }

    #[test]
    fn test_snippets_in_order_sorts_by_order() {
        let mut experiment: Experiment = serde_yaml::from_str(sample_yaml()).unwrap();
        experiment.snippets.reverse();
        let ordered = experiment.snippets_in_order();
        assert_eq!(ordered[0].kind, SnippetKind::Fit);
        assert_eq!(ordered[1].kind, SnippetKind::Predict);
    }

    #[test]
    fn test_validate_rejects_empty_snippets() {
        let mut experiment: Experiment = serde_yaml::from_str(sample_yaml()).unwrap();
        experiment.snippets.clear();
        assert!(matches!(experiment.validate(), Err(MhError::Config(_))));
    }

    #[test]
    fn test_env_manifest_lookup() {
        let yaml = "envs:\n  shell: sh\n  python: python3\n";
        let env: EnvManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(env.interpreter("shell").unwrap(), "sh");
        assert!(matches!(
            env.interpreter("julia"),
            Err(MhError::InterpreterNotFound(_))
        ));
    }
}
