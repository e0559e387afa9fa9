//! Trial preparation: numbered directories, each holding a mutated copy of
//! the base configuration and the log of what was changed.

use crate::space::SweepSpace;
use chrono::{DateTime, Utc};
use dp_types::{DpResult, HyperparamError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Configuration file written into every trial directory.
pub const TRIAL_CONF_FILE: &str = "conf.yaml";

/// Sweep manifest written at the sweep root.
pub const MANIFEST_FILE: &str = "sweep.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub root: PathBuf,
    pub trials: usize,
    /// Fixed seed for reproducible sweeps; fresh entropy when absent.
    pub seed: Option<u64>,
}

impl SweepConfig {
    pub fn new(root: impl Into<PathBuf>, trials: usize) -> Self {
        Self {
            root: root.into(),
            trials,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One prepared trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub number: usize,
    pub path: PathBuf,
    /// Sampled values keyed by `k1 : k2` path, as written into the trial
    /// configuration.
    pub parameters: BTreeMap<String, Value>,
}

/// Manifest of a prepared sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRun {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub seed: Option<u64>,
    pub trials: Vec<TrialRecord>,
}

impl SweepRun {
    pub fn save(&self, root: &Path) -> DpResult<PathBuf> {
        let path = root.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn load(root: &Path) -> DpResult<Self> {
        let text = fs::read_to_string(root.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Create `config.trials` trial directories under `config.root`.
///
/// Every trial starts from a fresh copy of `base`. Grid parameters are
/// consumed across trials, so a sweep stops early once any grid runs out.
pub fn prepare_trials(base: &Value, space: &SweepSpace, config: &SweepConfig) -> DpResult<SweepRun> {
    let mut hyperparams = space.build()?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    fs::create_dir_all(&config.root)?;

    let mut run = SweepRun {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        seed: config.seed,
        trials: Vec::with_capacity(config.trials),
    };
    info!(
        "Preparing {} trials in {} (sweep {})",
        config.trials,
        config.root.display(),
        run.id
    );

    for number in 0..config.trials {
        if let Some(hp) = hyperparams.iter().find(|hp| hp.remaining() == Some(0)) {
            let err = HyperparamError::Exhausted {
                path: hp.path_display(),
                count: number,
            };
            warn!("{}; stopping after {} trials", err, number);
            break;
        }

        let dir = config.root.join(number.to_string());
        fs::create_dir_all(&dir)?;
        let mut tree = base.clone();
        let mut parameters = BTreeMap::new();
        for hp in hyperparams.iter_mut() {
            let val = hp.assign_to_conf_with(&mut tree, &dir, &mut rng)?;
            parameters.insert(hp.path_display(), val.to_json());
        }
        dp_config::save_tree(&tree, dir.join(TRIAL_CONF_FILE))?;

        run.trials.push(TrialRecord {
            number,
            path: dir,
            parameters,
        });
    }

    run.save(&config.root)?;
    info!("Prepared {} trials", run.trials.len());
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperparams::CHANGED_PARAMS_FILE;
    use serde_json::json;
    use tempfile::TempDir;

    fn base() -> Value {
        json!({
            "target": "ttd",
            "model": { "lr": 0.001, "rnn_size": 200, "optimizer": "adam" },
            "training": { "batch_size": 128, "hyperparam_tuning": true }
        })
    }

    #[test]
    fn prepares_numbered_trials() {
        let dir = TempDir::new().unwrap();
        let space = SweepSpace::new()
            .add_log_uniform(&["model", "lr"], 1e-5, 1e-2)
            .add_categorical(&["model", "optimizer"], vec![json!("sgd"), json!("adam")]);
        let config = SweepConfig::new(dir.path(), 3).with_seed(5);

        let run = prepare_trials(&base(), &space, &config).unwrap();
        assert_eq!(run.trials.len(), 3);

        for record in &run.trials {
            let trial_dir = dir.path().join(record.number.to_string());
            assert_eq!(record.path, trial_dir);

            let tree = dp_config::load_tree(trial_dir.join(TRIAL_CONF_FILE)).unwrap();
            assert_eq!(tree["model"]["lr"], record.parameters["model : lr"]);
            assert_eq!(tree["model"]["rnn_size"], json!(200));

            let changed = fs::read_to_string(trial_dir.join(CHANGED_PARAMS_FILE)).unwrap();
            assert_eq!(changed.lines().count(), 2);
            assert!(changed.starts_with("model : lr : "));
        }
    }

    #[test]
    fn grid_exhaustion_stops_early() {
        let dir = TempDir::new().unwrap();
        let space = SweepSpace::new().add_grid(&["model", "rnn_size"], vec![json!(64), json!(128)]);
        let config = SweepConfig::new(dir.path(), 5);

        let run = prepare_trials(&base(), &space, &config).unwrap();
        assert_eq!(run.trials.len(), 2);
        assert_eq!(run.trials[1].parameters["model : rnn_size"], json!(128));
        assert!(!dir.path().join("2").exists());
    }

    #[test]
    fn same_seed_same_sweep() {
        let space = SweepSpace::new()
            .add_float(&["model", "dropout_prob"], 0.0, 0.5)
            .add_int(&["training", "batch_size"], 32, 512);
        let params = |seed| {
            let dir = TempDir::new().unwrap();
            let run = prepare_trials(&base(), &space, &SweepConfig::new(dir.path(), 4).with_seed(seed)).unwrap();
            run.trials.into_iter().map(|t| t.parameters).collect::<Vec<_>>()
        };
        assert_eq!(params(42), params(42));
        assert_ne!(params(42), params(43));
    }

    #[test]
    fn manifest_round_trips() {
        let dir = TempDir::new().unwrap();
        let space = SweepSpace::new()
            .add_int(&["training", "batch_size"], 32, 64)
            .add_grid(&["model", "rnn_size"], vec![json!(64), json!(128)])
            .add_categorical(&["model", "dropout_prob"], vec![json!(0.1), json!(0.2)])
            .add_float(&["model", "lr"], 1e-4, 1e-2);
        let run = prepare_trials(&base(), &space, &SweepConfig::new(dir.path(), 2).with_seed(1)).unwrap();
        assert_eq!(run.trials[0].parameters["model : rnn_size"], json!(64));

        let loaded = SweepRun::load(dir.path()).unwrap();
        assert_eq!(loaded, run);
        assert_eq!(loaded.seed, Some(1));
    }

    #[test]
    fn bad_path_aborts() {
        let dir = TempDir::new().unwrap();
        let space = SweepSpace::new().add_int(&["callbacks", "patience"], 1, 5);
        assert!(prepare_trials(&base(), &space, &SweepConfig::new(dir.path(), 1)).is_err());
    }
}
