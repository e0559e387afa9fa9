//! Hyperparameters: sampling strategies bound to a path in the nested
//! configuration tree.

use dp_types::{DpResult, HyperparamError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Append-only record of every value assigned in a trial directory.
pub const CHANGED_PARAMS_FILE: &str = "changed_params.out";

/// A concrete parameter value produced by a sampler.
// Int before Float: untagged deserialization tries variants in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Json(Value),
}

impl ParameterValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Int(v) => Value::from(*v),
            Self::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the fractional part, so 1.0 never reads as an int.
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Int(v) => write!(f, "{v}"),
            // Strings are written bare so the log reads like the YAML.
            Self::Json(Value::String(s)) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// How a hyperparameter draws its values.
pub enum Sampler {
    /// Uniform choice with replacement.
    Categorical { values: Vec<Value> },
    /// Each value once, in order; fails once exhausted.
    GridCategorical { values: Vec<Value>, cursor: usize },
    /// Uniform real in `[lo, hi]`.
    Continuous { lo: f64, hi: f64 },
    /// Log-uniform in `[10^log_lo, 10^log_hi]`.
    LogContinuous { log_lo: f64, log_hi: f64 },
    /// Uniform integer in `[lo, hi]`, inclusive.
    Integer { lo: i64, hi: i64 },
    /// Caller-supplied sampler.
    Generic(Box<dyn FnMut() -> ParameterValue + Send>),
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Categorical { values } => f.debug_struct("Categorical").field("values", values).finish(),
            Self::GridCategorical { values, cursor } => f
                .debug_struct("GridCategorical")
                .field("values", values)
                .field("cursor", cursor)
                .finish(),
            Self::Continuous { lo, hi } => f.debug_struct("Continuous").field("lo", lo).field("hi", hi).finish(),
            Self::LogContinuous { log_lo, log_hi } => f
                .debug_struct("LogContinuous")
                .field("log_lo", log_lo)
                .field("log_hi", log_hi)
                .finish(),
            Self::Integer { lo, hi } => f.debug_struct("Integer").field("lo", lo).field("hi", hi).finish(),
            Self::Generic(_) => f.write_str("Generic(<fn>)"),
        }
    }
}

/// A sampler bound to a configuration path such as `["model", "lr"]`.
#[derive(Debug)]
pub struct Hyperparam {
    path: Vec<String>,
    sampler: Sampler,
}

impl Hyperparam {
    fn with_sampler<I, S>(path: I, sampler: Sampler) -> Result<Self, HyperparamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        if path.is_empty() {
            return Err(HyperparamError::EmptyPath);
        }
        let hp = Self { path, sampler };
        hp.validate()?;
        Ok(hp)
    }

    pub fn categorical<I, S>(path: I, values: Vec<Value>) -> Result<Self, HyperparamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_sampler(path, Sampler::Categorical { values })
    }

    pub fn grid_categorical<I, S>(path: I, values: Vec<Value>) -> Result<Self, HyperparamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_sampler(path, Sampler::GridCategorical { values, cursor: 0 })
    }

    pub fn continuous<I, S>(path: I, lo: f64, hi: f64) -> Result<Self, HyperparamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_sampler(path, Sampler::Continuous { lo, hi })
    }

    /// Bounds are given on the linear scale and must be positive.
    pub fn log_continuous<I, S>(path: I, lo: f64, hi: f64) -> Result<Self, HyperparamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        if !(lo > 0.0 && hi > 0.0) {
            return Err(HyperparamError::InvalidBounds { path: path.join(" : "), lo, hi });
        }
        Self::with_sampler(
            path,
            Sampler::LogContinuous {
                log_lo: lo.log10(),
                log_hi: hi.log10(),
            },
        )
    }

    pub fn integer<I, S>(path: I, lo: i64, hi: i64) -> Result<Self, HyperparamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_sampler(path, Sampler::Integer { lo, hi })
    }

    pub fn generic<I, S, F>(path: I, choice_fn: F) -> Result<Self, HyperparamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut() -> ParameterValue + Send + 'static,
    {
        Self::with_sampler(path, Sampler::Generic(Box::new(choice_fn)))
    }

    fn validate(&self) -> Result<(), HyperparamError> {
        let invalid = |lo: f64, hi: f64| HyperparamError::InvalidBounds {
            path: self.path_display(),
            lo,
            hi,
        };
        match &self.sampler {
            Sampler::Categorical { values } | Sampler::GridCategorical { values, .. }
                if values.is_empty() =>
            {
                Err(HyperparamError::EmptyChoices { path: self.path_display() })
            }
            Sampler::Continuous { lo, hi } if !(lo <= hi && (hi - lo).is_finite()) => {
                Err(invalid(*lo, *hi))
            }
            Sampler::LogContinuous { log_lo, log_hi }
                if !(log_lo <= log_hi && (log_hi - log_lo).is_finite()) =>
            {
                Err(invalid(10f64.powf(*log_lo), 10f64.powf(*log_hi)))
            }
            Sampler::Integer { lo, hi } if lo > hi => Err(invalid(*lo as f64, *hi as f64)),
            _ => Ok(()),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Path rendered the way the changed-parameters log writes it.
    pub fn path_display(&self) -> String {
        self.path.join(" : ")
    }

    /// Values left before a grid sampler is exhausted; `None` for samplers
    /// that never run out.
    pub fn remaining(&self) -> Option<usize> {
        match &self.sampler {
            Sampler::GridCategorical { values, cursor } => Some(values.len() - cursor),
            _ => None,
        }
    }

    /// Draw one value using the thread-local RNG.
    pub fn choice(&mut self) -> Result<ParameterValue, HyperparamError> {
        self.choice_with(&mut rand::thread_rng())
    }

    /// Draw one value from `rng`, for reproducible sweeps.
    pub fn choice_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ParameterValue, HyperparamError> {
        let value = match &mut self.sampler {
            Sampler::Categorical { values } => {
                let idx = rng.gen_range(0..values.len());
                ParameterValue::Json(values[idx].clone())
            }
            Sampler::GridCategorical { values, cursor } => {
                let value = values.get(*cursor).cloned().ok_or_else(|| HyperparamError::Exhausted {
                    path: self.path.join(" : "),
                    count: values.len(),
                })?;
                *cursor += 1;
                ParameterValue::Json(value)
            }
            Sampler::Continuous { lo, hi } => ParameterValue::Float(rng.gen_range(*lo..=*hi)),
            Sampler::LogContinuous { log_lo, log_hi } => {
                let exponent: f64 = rng.gen_range(*log_lo..=*log_hi);
                ParameterValue::Float(10f64.powf(exponent))
            }
            Sampler::Integer { lo, hi } => ParameterValue::Int(rng.gen_range(*lo..=*hi)),
            Sampler::Generic(choice_fn) => choice_fn(),
        };
        Ok(value)
    }

    /// Read the value this hyperparameter controls.
    pub fn get_conf_entry<'c>(&self, conf: &'c Value) -> Result<&'c Value, HyperparamError> {
        let mut el = conf;
        for key in &self.path {
            el = el.get(key).ok_or_else(|| HyperparamError::MissingEntry {
                path: self.path_display(),
            })?;
        }
        Ok(el)
    }

    /// Overwrite the value this hyperparameter controls. Every parent along
    /// the path must already exist as a mapping; the leaf may be new.
    pub fn set_conf_entry(&self, conf: &mut Value, value: Value) -> Result<(), HyperparamError> {
        let (leaf, parents) = self.path.split_last().ok_or(HyperparamError::EmptyPath)?;
        let mut el = conf;
        for key in parents {
            el = el.get_mut(key).ok_or_else(|| HyperparamError::InvalidPath {
                path: self.path_display(),
                message: format!("missing key {key}"),
            })?;
        }
        let map = el.as_object_mut().ok_or_else(|| HyperparamError::InvalidPath {
            path: self.path_display(),
            message: "parent is not a mapping".to_string(),
        })?;
        map.insert(leaf.clone(), value);
        Ok(())
    }

    /// Sample a value, write it into `conf`, and append `path : value` to
    /// `save_path/changed_params.out`.
    pub fn assign_to_conf(&mut self, conf: &mut Value, save_path: &Path) -> DpResult<ParameterValue> {
        let val = self.choice()?;
        self.assign_value(conf, save_path, val)
    }

    /// Same as [`assign_to_conf`](Self::assign_to_conf) with an explicit RNG.
    pub fn assign_to_conf_with<R: Rng + ?Sized>(
        &mut self,
        conf: &mut Value,
        save_path: &Path,
        rng: &mut R,
    ) -> DpResult<ParameterValue> {
        let val = self.choice_with(rng)?;
        self.assign_value(conf, save_path, val)
    }

    fn assign_value(&self, conf: &mut Value, save_path: &Path, val: ParameterValue) -> DpResult<ParameterValue> {
        info!("{}: {}", self.path_display(), val);
        self.set_conf_entry(conf, val.to_json())?;

        let mut outfile = OpenOptions::new()
            .create(true)
            .append(true)
            .open(save_path.join(CHANGED_PARAMS_FILE))?;
        for key in &self.path {
            write!(outfile, "{key} : ")?;
        }
        writeln!(outfile, "{val}")?;
        Ok(val)
    }
}
