//! # dp-config
//!
//! Turns an experiment YAML file into a [`ResolvedConfig`]: the dataset's
//! signals and shot lists, every derived filesystem path, and the training
//! target.
//!
//! The dataset ladder is a declarative table ([`Dataset::spec`]); unknown
//! dataset or target names surface as [`dp_types::ConfigError`] values that
//! callers treat as fatal.

pub mod datasets;
pub mod hashing;
pub mod resolver;
pub mod schema;
pub mod shots;
pub mod signals;

pub use datasets::{Dataset, DatasetSpec, UseSignals};
pub use hashing::{Sha256SignalHasher, SignalHasher};
pub use resolver::{current_user, ConfigResolver, ResolvedConfig, ResolvedPaths};
pub use schema::{DataSection, ExperimentConfig, ModelSection, PathsSection, SignalPrepath, TrainingSection};
pub use shots::{ShotListFiles, ShotSet};
pub use signals::{signal, SignalGroup, PROFILE_CHANNELS};

use dp_types::{ConfigError, DpResult};
use std::fs;
use std::path::Path;

/// Load an experiment file as an untyped tree, the form hyperparameter
/// sweeps mutate.
pub fn load_tree<P: AsRef<Path>>(path: P) -> DpResult<serde_json::Value> {
    let path = path.as_ref();
    tracing::info!("Loading configuration from: {}", path.display());
    let text = fs::read_to_string(path).map_err(|e| {
        ConfigError::Other(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let tree: serde_json::Value = serde_yaml::from_str(&text)?;
    Ok(tree)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> DpResult<ExperimentConfig> {
    Ok(serde_json::from_value(load_tree(path)?)?)
}

/// Write a configuration tree back out as YAML.
pub fn save_tree<P: AsRef<Path>>(tree: &serde_json::Value, path: P) -> DpResult<()> {
    let text = serde_yaml::to_string(tree)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dp_types::SingleProcess;
    use tempfile::TempDir;

    const YAML: &str = r#"
fs_path: /scratch
target: binary
paths:
  data: jet_data_0D
  signal_prepath: /signal_data/
  shot_list_dir: /shot_lists/
  tensorboard_save_path: /Graph/
training:
  hyperparam_tuning: false
model:
  shallow: false
  loss_scale_factor: 1.0
data:
  T_warning: 0.4
  augment_during_training: false
"#;

    #[test]
    fn load_and_resolve_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.yaml");
        fs::write(&path, YAML).unwrap();

        let conf = load_config(&path).unwrap();
        let ctx = SingleProcess;
        let resolved = ConfigResolver::new(&ctx).with_user_name("bob").resolve(conf).unwrap();

        assert_eq!(resolved.target, dp_targets::Target::Binary);
        assert_eq!(resolved.paths.output_path, "/scratch/bob");
        assert!(resolved.paths.use_signals.iter().all(|s| !s.is_profile()));
        assert_eq!(resolved.paths.shot_files_test[0].description, "jet iter like wall data");
    }

    #[test]
    fn tree_round_trips_through_yaml() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("conf.yaml");
        fs::write(&src, YAML).unwrap();

        let mut tree = load_tree(&src).unwrap();
        tree["model"]["lr"] = serde_json::json!(0.001);
        let dst = dir.path().join("out.yaml");
        save_tree(&tree, &dst).unwrap();

        let reloaded = load_tree(&dst).unwrap();
        assert_eq!(reloaded["model"]["lr"], serde_json::json!(0.001));
        assert_eq!(reloaded["paths"]["data"], serde_json::json!("jet_data_0D"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_tree("/nonexistent/conf.yaml").is_err());
    }
}
