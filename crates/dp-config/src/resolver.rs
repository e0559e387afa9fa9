//! Expands an [`ExperimentConfig`] into concrete paths, signals, shot lists
//! and the training target.

use dp_targets::Target;
use dp_types::{sort_by_channels, ConfigError, DpResult, ExecutionContext, Machine, Signal};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::datasets::Dataset;
use crate::hashing::{Sha256SignalHasher, SignalHasher};
use crate::schema::{DataSection, ExperimentConfig, ModelSection, SignalPrepath, TrainingSection};
use crate::shots::ShotListFiles;

/// Paths and selections derived from the `paths` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPaths {
    pub data: String,
    pub base_path: String,
    pub output_path: String,
    pub signal_prepath: SignalPrepath,
    pub shot_list_dir: String,
    pub global_normalizer_path: String,
    pub normalizer_path: String,
    pub model_save_path: String,
    pub csvlog_save_path: String,
    pub results_prepath: String,
    pub tensorboard_save_path: String,
    pub saved_shotlist_path: String,
    pub processed_prepath: String,
    pub specific_signals: Vec<String>,
    /// `(name, signal)` pairs available for training, in table order.
    pub use_signals_dict: Vec<(String, Signal)>,
    pub all_signals_dict: Vec<(String, Signal)>,
    /// Signals used for training, profiles last.
    pub use_signals: Vec<Signal>,
    pub all_signals: Vec<Signal>,
    pub shot_files: Vec<ShotListFiles>,
    pub shot_files_test: Vec<ShotListFiles>,
    pub shot_files_all: Vec<ShotListFiles>,
    pub all_machines: Vec<Machine>,
    pub extra: BTreeMap<String, Value>,
}

/// A fully expanded experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub user_name: String,
    pub fs_path: String,
    pub target_name: String,
    pub dataset: String,
    pub signal_group_hash: u128,
    pub target: Target,
    pub paths: ResolvedPaths,
    pub training: TrainingSection,
    pub model: ModelSection,
    pub data: DataSection,
    pub extra: BTreeMap<String, Value>,
}

impl ResolvedConfig {
    pub fn t_warning(&self) -> f64 {
        self.data.t_warning
    }

    /// Offline loss of the configured target, scaled by
    /// `model.loss_scale_factor`.
    pub fn loss_np(&self, y_true: &[f64], y_pred: &[f64]) -> DpResult<f64> {
        Ok(self.target.loss_np(y_true, y_pred, self.model.loss_scale_factor)?)
    }
}

/// Name of the user running the experiment, read the way login shells
/// publish it.
pub fn current_user() -> Result<String, ConfigError> {
    ["LOGNAME", "USER", "LNAME", "USERNAME"]
        .iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()))
        .ok_or(ConfigError::UnknownUser)
}

pub struct ConfigResolver<'a> {
    ctx: &'a dyn ExecutionContext,
    hasher: Box<dyn SignalHasher>,
    user_name: Option<String>,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(ctx: &'a dyn ExecutionContext) -> Self {
        Self {
            ctx,
            hasher: Box::new(Sha256SignalHasher),
            user_name: None,
        }
    }

    pub fn with_hasher(mut self, hasher: Box<dyn SignalHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Use a fixed user name instead of the login environment.
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Resolve a raw configuration tree, e.g. one a hyperparameter sweep has
    /// just mutated.
    pub fn resolve_tree(&self, tree: &Value) -> DpResult<ResolvedConfig> {
        let conf: ExperimentConfig = serde_json::from_value(tree.clone())?;
        self.resolve(conf)
    }

    pub fn resolve(&self, conf: ExperimentConfig) -> DpResult<ResolvedConfig> {
        let ExperimentConfig {
            fs_path,
            target: target_name,
            paths,
            training,
            model,
            data,
            extra,
        } = conf;

        if !(data.t_warning > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "data.T_warning".to_string(),
                message: format!("must be strictly positive, got {}", data.t_warning),
            }
            .into());
        }

        let target = Target::select(&target_name, model.shallow).map_err(|e| {
            self.ctx.print_unique("Unknown type of target. Exiting");
            e
        })?;
        let dataset: Dataset = paths.data.parse().map_err(|e| {
            self.ctx.print_unique(&format!("Unknown dataset {}", paths.data));
            e
        })?;
        let spec = dataset.spec();

        let user_name = match &self.user_name {
            Some(name) => name.clone(),
            None => current_user()?,
        };
        let output_path = format!("{}/{}", fs_path, user_name);
        let base_path = output_path.clone();
        info!("Resolving experiment for dataset {} under {}", dataset, output_path);

        if let SignalPrepath::Multiple(_) = paths.signal_prepath {
            self.ctx.print_unique("reading from multiple data folders!");
        }
        let signal_prepath = paths.signal_prepath.prefixed(&base_path);
        let shot_list_dir = format!("{}{}", base_path, paths.shot_list_dir);

        let all_signals_dict = spec.all_signals.entries();
        let group: Vec<Signal> = all_signals_dict.iter().map(|(_, s)| s.clone()).collect();
        let h = self
            .hasher
            .hash_signals(&group)
            .wrapping_mul(dataset.hash_multiplier());
        debug!("Signal group hash for {}: {}", dataset, h);

        let global_normalizer_path =
            format!("{output_path}/normalization/normalization_signal_group_{h}.npz");
        let (normalizer_path, model_save_path, csvlog_save_path, results_prepath) =
            if training.hyperparam_tuning {
                (
                    format!("./normalization/normalization_signal_group_{h}.npz"),
                    "./model_checkpoints/".to_string(),
                    "./csv_logs/".to_string(),
                    "./results/".to_string(),
                )
            } else {
                (
                    global_normalizer_path.clone(),
                    format!("{output_path}/model_checkpoints/"),
                    format!("{output_path}/csv_logs/"),
                    format!("{output_path}/results/"),
                )
            };
        let tensorboard_save_path = format!("{}{}", output_path, paths.tensorboard_save_path);
        let saved_shotlist_path = format!(
            "{}/processed_shotlists_torch/{}/shot_lists_signal_group_{}.npz",
            base_path, paths.data, h
        );
        let processed_prepath = format!("{output_path}/processed_shots_torch/signal_group_{h}/");

        let use_signals_dict = spec.use_signals.entries();
        let (specific_signals, mut use_signals) =
            self.select_signals(&paths.specific_signals, &use_signals_dict, &paths.data);
        sort_by_channels(&mut use_signals);
        let mut all_signals = group;
        sort_by_channels(&mut all_signals);

        let descriptions: Vec<&str> = use_signals.iter().map(|s| s.description.as_str()).collect();
        self.ctx.print_unique(&format!(
            "Selected signals (determines which signals are used for training):\n{:?}",
            descriptions
        ));

        let shot_files: Vec<ShotListFiles> =
            spec.shot_files.iter().map(|s| s.in_dir(&shot_list_dir)).collect();
        let shot_files_test: Vec<ShotListFiles> = spec
            .shot_files_test
            .iter()
            .map(|s| s.in_dir(&shot_list_dir))
            .collect();
        let shot_files_all: Vec<ShotListFiles> =
            shot_files.iter().chain(&shot_files_test).cloned().collect();
        let all_machines: Vec<Machine> = shot_files_all
            .iter()
            .map(|f| f.machine)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(ResolvedConfig {
            user_name,
            fs_path,
            target_name,
            dataset: dataset.id().to_string(),
            signal_group_hash: h,
            target,
            paths: ResolvedPaths {
                data: paths.data,
                base_path,
                output_path,
                signal_prepath,
                shot_list_dir,
                global_normalizer_path,
                normalizer_path,
                model_save_path,
                csvlog_save_path,
                results_prepath,
                tensorboard_save_path,
                saved_shotlist_path,
                processed_prepath,
                specific_signals,
                use_signals_dict,
                all_signals_dict,
                use_signals,
                all_signals,
                shot_files,
                shot_files_test,
                shot_files_all,
                all_machines,
                extra: paths.extra,
            },
            training,
            model,
            data,
            extra,
        })
    }

    /// Narrow the dataset's signals to `specific` when it is non-empty.
    /// Unknown names are reported and dropped.
    fn select_signals(
        &self,
        specific: &[String],
        available: &[(String, Signal)],
        data: &str,
    ) -> (Vec<String>, Vec<Signal>) {
        if specific.is_empty() {
            return (Vec::new(), available.iter().map(|(_, s)| s.clone()).collect());
        }

        let machine = data.split('_').next().unwrap_or(data);
        let mut kept = Vec::new();
        let mut selected = Vec::new();
        for name in specific {
            match available.iter().find(|(k, _)| k == name) {
                Some((_, signal)) => {
                    kept.push(name.clone());
                    selected.push(signal.clone());
                }
                None => self.ctx.print_unique(&format!(
                    "Signal {} is not fully defined for {} machine. Skipping...",
                    name, machine
                )),
            }
        }
        (kept, selected)
    }
}
