//! # dp-optimizer
//!
//! Hyperparameter sweeps for the training pipeline: samplers bound to paths
//! in the experiment configuration, declarative sweep spaces, trial
//! directory preparation, and reading trial results back.

mod experiment;
mod hyperparams;
mod space;
mod sweep;

pub use experiment::{
    rank_experiments, scan_experiments, HyperparamExperiment, TrialNumber, TrialStatus, EPOCH_LOG_FILE,
    MONITORED_METRIC, NO_MAXIMUM,
};
pub use hyperparams::{Hyperparam, ParameterValue, Sampler, CHANGED_PARAMS_FILE};
pub use space::{HyperparamDef, SweepSpace};
pub use sweep::{prepare_trials, SweepConfig, SweepRun, TrialRecord, MANIFEST_FILE, TRIAL_CONF_FILE};
