//! Experiment configuration as written in the YAML file.
//!
//! Only the keys the resolver reads are typed; everything else is carried
//! through untouched in the `extra` maps so the training code still sees it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn default_loss_scale_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Root of the shared filesystem; per-user data lives below it.
    pub fs_path: String,
    /// One of `hinge`, `binary`, `ttd`, `ttdinv`, `ttdlinear`.
    pub target: String,
    pub paths: PathsSection,
    pub training: TrainingSection,
    pub model: ModelSection,
    pub data: DataSection,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One data folder or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalPrepath {
    Single(String),
    Multiple(Vec<String>),
}

impl SignalPrepath {
    pub fn prefixed(&self, base: &str) -> Self {
        match self {
            SignalPrepath::Single(p) => SignalPrepath::Single(format!("{base}{p}")),
            SignalPrepath::Multiple(ps) => {
                SignalPrepath::Multiple(ps.iter().map(|p| format!("{base}{p}")).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    /// Dataset identifier.
    pub data: String,
    pub signal_prepath: SignalPrepath,
    pub shot_list_dir: String,
    pub tensorboard_save_path: String,
    #[serde(default)]
    pub specific_signals: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSection {
    pub hyperparam_tuning: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default)]
    pub shallow: bool,
    #[serde(default = "default_loss_scale_factor")]
    pub loss_scale_factor: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// Warning window in seconds.
    #[serde(rename = "T_warning")]
    pub t_warning: f64,
    #[serde(default)]
    pub signal_to_augment: Option<String>,
    pub augment_during_training: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
fs_path: /tigress
target: ttd
num_gpus: 4
paths:
  data: d3d_data
  signal_prepath: /signal_data/
  shot_list_dir: /shot_lists/
  tensorboard_save_path: /Graph/
  specific_signals: []
  executable: mpi_learn.py
training:
  hyperparam_tuning: false
  num_epochs: 20
model:
  shallow: false
  lr: 0.0002
data:
  T_warning: 1.024
  signal_to_augment: null
  augment_during_training: false
"#;

    #[test]
    fn parses_and_keeps_unknown_keys() {
        let conf: ExperimentConfig = serde_yaml::from_str(YAML).unwrap();
        assert_eq!(conf.target, "ttd");
        assert_eq!(conf.paths.signal_prepath, SignalPrepath::Single("/signal_data/".into()));
        assert_eq!(conf.model.loss_scale_factor, 1.0);
        assert_eq!(conf.data.t_warning, 1.024);
        assert!(conf.data.signal_to_augment.is_none());
        assert_eq!(conf.extra["num_gpus"], serde_json::json!(4));
        assert_eq!(conf.training.extra["num_epochs"], serde_json::json!(20));
        assert_eq!(conf.paths.extra["executable"], serde_json::json!("mpi_learn.py"));
    }

    #[test]
    fn multiple_prepaths() {
        let yaml = YAML.replace(
            "signal_prepath: /signal_data/",
            "signal_prepath: [/signal_data/, /signal_data_new/]",
        );
        let conf: ExperimentConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            conf.paths.signal_prepath.prefixed("/base"),
            SignalPrepath::Multiple(vec![
                "/base/signal_data/".to_string(),
                "/base/signal_data_new/".to_string()
            ])
        );
    }

    #[test]
    fn augment_flag_must_be_boolean() {
        let yaml = YAML.replace("augment_during_training: false", "augment_during_training: 3");
        assert!(serde_yaml::from_str::<ExperimentConfig>(&yaml).is_err());
    }
}
