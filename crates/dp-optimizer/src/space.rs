//! Declarative sweep spaces, loadable from YAML.

use crate::hyperparams::Hyperparam;
use dp_types::{ConfigError, DpResult, HyperparamError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One hyperparameter as written in a sweep file.
///
/// ```yaml
/// - kind: log_continuous
///   path: [model, lr]
///   lo: 1.0e-5
///   hi: 1.0e-2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HyperparamDef {
    Categorical { path: Vec<String>, values: Vec<Value> },
    GridCategorical { path: Vec<String>, values: Vec<Value> },
    Continuous { path: Vec<String>, lo: f64, hi: f64 },
    LogContinuous { path: Vec<String>, lo: f64, hi: f64 },
    Integer { path: Vec<String>, lo: i64, hi: i64 },
}

impl HyperparamDef {
    pub fn path(&self) -> &[String] {
        match self {
            Self::Categorical { path, .. }
            | Self::GridCategorical { path, .. }
            | Self::Continuous { path, .. }
            | Self::LogContinuous { path, .. }
            | Self::Integer { path, .. } => path,
        }
    }

    pub fn build(&self) -> Result<Hyperparam, HyperparamError> {
        match self {
            Self::Categorical { path, values } => Hyperparam::categorical(path.clone(), values.clone()),
            Self::GridCategorical { path, values } => {
                Hyperparam::grid_categorical(path.clone(), values.clone())
            }
            Self::Continuous { path, lo, hi } => Hyperparam::continuous(path.clone(), *lo, *hi),
            Self::LogContinuous { path, lo, hi } => Hyperparam::log_continuous(path.clone(), *lo, *hi),
            Self::Integer { path, lo, hi } => Hyperparam::integer(path.clone(), *lo, *hi),
        }
    }
}

/// The set of hyperparameters a sweep varies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepSpace {
    pub hyperparams: Vec<HyperparamDef>,
}

fn path_of(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| s.to_string()).collect()
}

impl SweepSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_categorical(mut self, path: &[&str], values: Vec<Value>) -> Self {
        self.hyperparams.push(HyperparamDef::Categorical {
            path: path_of(path),
            values,
        });
        self
    }

    pub fn add_grid(mut self, path: &[&str], values: Vec<Value>) -> Self {
        self.hyperparams.push(HyperparamDef::GridCategorical {
            path: path_of(path),
            values,
        });
        self
    }

    pub fn add_float(mut self, path: &[&str], lo: f64, hi: f64) -> Self {
        self.hyperparams.push(HyperparamDef::Continuous {
            path: path_of(path),
            lo,
            hi,
        });
        self
    }

    pub fn add_log_uniform(mut self, path: &[&str], lo: f64, hi: f64) -> Self {
        self.hyperparams.push(HyperparamDef::LogContinuous {
            path: path_of(path),
            lo,
            hi,
        });
        self
    }

    pub fn add_int(mut self, path: &[&str], lo: i64, hi: i64) -> Self {
        self.hyperparams.push(HyperparamDef::Integer {
            path: path_of(path),
            lo,
            hi,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.hyperparams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hyperparams.is_empty()
    }

    /// Instantiate fresh samplers. Grid cursors start at zero on every call.
    pub fn build(&self) -> Result<Vec<Hyperparam>, HyperparamError> {
        self.hyperparams.iter().map(HyperparamDef::build).collect()
    }

    /// Upper bound on trials imposed by grid parameters, if any.
    pub fn max_trials(&self) -> Option<usize> {
        self.hyperparams
            .iter()
            .filter_map(|hp| match hp {
                HyperparamDef::GridCategorical { values, .. } => Some(values.len()),
                _ => None,
            })
            .min()
    }

    pub fn from_yaml_str(text: &str) -> DpResult<Self> {
        let space: SweepSpace = serde_yaml::from_str(text)?;
        space.build()?;
        Ok(space)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> DpResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading sweep space from: {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| {
            ConfigError::Other(format!("Failed to read sweep space {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SPACE: &str = r#"
hyperparams:
  - kind: log_continuous
    path: [model, lr]
    lo: 1.0e-5
    hi: 1.0e-2
  - kind: grid_categorical
    path: [model, rnn_size]
    values: [64, 128, 256]
  - kind: categorical
    path: [model, optimizer]
    values: [adam, sgd]
  - kind: integer
    path: [model, rnn_layers]
    lo: 1
    hi: 3
  - kind: continuous
    path: [model, dropout_prob]
    lo: 0.05
    hi: 0.3
"#;

    #[test]
    fn parses_every_kind() {
        let space = SweepSpace::from_yaml_str(SPACE).unwrap();
        assert_eq!(space.len(), 5);
        assert_eq!(space.hyperparams[1].path(), ["model", "rnn_size"]);
        assert_eq!(space.max_trials(), Some(3));

        let built = space.build().unwrap();
        assert_eq!(built[0].path_display(), "model : lr");
        assert_eq!(built[1].remaining(), Some(3));
    }

    #[test]
    fn builder_matches_yaml() {
        let space = SweepSpace::new()
            .add_log_uniform(&["model", "lr"], 1e-5, 1e-2)
            .add_grid(&["model", "rnn_size"], vec![json!(64), json!(128), json!(256)])
            .add_categorical(&["model", "optimizer"], vec![json!("adam"), json!("sgd")])
            .add_int(&["model", "rnn_layers"], 1, 3)
            .add_float(&["model", "dropout_prob"], 0.05, 0.3);
        assert_eq!(space, SweepSpace::from_yaml_str(SPACE).unwrap());
    }

    #[test]
    fn unbounded_without_grid() {
        let space = SweepSpace::new().add_float(&["model", "dropout_prob"], 0.0, 0.5);
        assert_eq!(space.max_trials(), None);
        assert!(SweepSpace::new().is_empty());
    }

    #[test]
    fn invalid_definitions_fail_at_load() {
        let bad = "hyperparams:\n  - kind: integer\n    path: [model, rnn_layers]\n    lo: 5\n    hi: 1\n";
        assert!(SweepSpace::from_yaml_str(bad).is_err());

        let unknown = "hyperparams:\n  - kind: bayesian\n    path: [model, lr]\n";
        assert!(SweepSpace::from_yaml_str(unknown).is_err());
    }
}
