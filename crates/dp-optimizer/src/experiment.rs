//! Reading back the results of a trial directory.
//!
//! A trial directory `<root>/<n>/` holds the per-epoch log and the
//! changed-parameters record; the raw stdout of the run sits next to it as
//! `<root>/<n>.out`. Logs that do not exist yet mean the trial has not
//! produced output, which is a normal state rather than an error.

use crate::hyperparams::CHANGED_PARAMS_FILE;
use dp_types::{DpResult, ExperimentError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const EPOCH_LOG_FILE: &str = "epoch_train_log.txt";

pub const MONITORED_METRIC: &str = "Val ROC";

/// `(value, epoch)` reported when no epochs have been recorded.
pub const NO_MAXIMUM: (f64, f64) = (-1.0, -1.0);

const EPOCH_COLUMN: usize = 0;
const METRIC_COLUMN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrialStatus::Running => "Running",
            TrialStatus::Completed => "Completed",
            TrialStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Trial identifier: the directory name when it is a number, else the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialNumber {
    Number(u64),
    Path(String),
}

impl fmt::Display for TrialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialNumber::Number(n) => write!(f, "{n}"),
            TrialNumber::Path(p) => f.write_str(p),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HyperparamExperiment {
    pub path: PathBuf,
    pub epochs: Vec<f64>,
    pub values: Vec<f64>,
    pub finished: bool,
    pub success: bool,
    /// Raw contents of `changed_params.out`.
    pub changed: String,
    pub name_to_monitor: String,
}

impl HyperparamExperiment {
    pub fn load<P: AsRef<Path>>(path: P) -> DpResult<Self> {
        // Dropping a trailing separator keeps the sibling `.out` path right.
        let path: PathBuf = path.as_ref().components().collect();
        if !path.is_dir() {
            return Err(ExperimentError::NotATrial {
                path: path.display().to_string(),
            }
            .into());
        }

        let (epochs, values) = read_epoch_log(&path.join(EPOCH_LOG_FILE))?;
        let changed = fs::read_to_string(path.join(CHANGED_PARAMS_FILE))?;
        debug!("changed values: {}", changed);
        let (finished, success) = read_raw_log(&raw_log_path(&path))?;
        debug!("finished: {}, success: {}", finished, success);

        Ok(Self {
            path,
            epochs,
            values,
            finished,
            success,
            changed,
            name_to_monitor: MONITORED_METRIC.to_string(),
        })
    }

    pub fn raw_log_path(&self) -> PathBuf {
        raw_log_path(&self.path)
    }

    pub fn get_number(&self) -> TrialNumber {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse().ok())
            .map(TrialNumber::Number)
            .unwrap_or_else(|| TrialNumber::Path(self.path.display().to_string()))
    }

    /// Best monitored value and the epoch it was reached at. Ties go to the
    /// earliest epoch; NaN ranks above every number, so the first NaN wins.
    pub fn best(&self) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for (&value, &epoch) in self.values.iter().zip(&self.epochs) {
            match best {
                Some((b, _)) if cmp_metric(value, b) != Ordering::Greater => {}
                _ => best = Some((value, epoch)),
            }
        }
        best
    }

    /// Like [`best`](Self::best) but with the [`NO_MAXIMUM`] sentinel.
    pub fn get_maximum(&self) -> (f64, f64) {
        self.best().unwrap_or(NO_MAXIMUM)
    }

    pub fn status(&self) -> TrialStatus {
        match (self.finished, self.success) {
            (true, true) => TrialStatus::Completed,
            (true, false) => TrialStatus::Failed,
            _ => TrialStatus::Running,
        }
    }

    pub fn summary(&self) -> String {
        let state = if self.finished { "Finished" } else { "Running" };
        let (value, epoch) = self.get_maximum();
        let line = format!(
            "# {} [{}] maximum of {} at epoch {}",
            self.get_number(),
            state,
            value,
            epoch
        );
        info!("{}", line);
        line
    }
}

impl fmt::Display for HyperparamExperiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(20);
        let (value, epoch) = self.get_maximum();
        writeln!(f, "Experiment:")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "# {}", self.get_number())?;
        writeln!(f, "{rule}")?;
        write!(f, "{}", self.changed)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Maximum of {value} at epoch {epoch}")?;
        writeln!(f, "{rule}")
    }
}

impl PartialEq for HyperparamExperiment {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for HyperparamExperiment {}

impl PartialOrd for HyperparamExperiment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HyperparamExperiment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path.cmp(&other.path)
    }
}

/// Total order on metric values with NaN above every number.
fn cmp_metric(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

fn raw_log_path(dir: &Path) -> PathBuf {
    let mut os = dir.as_os_str().to_owned();
    os.push(".out");
    PathBuf::from(os)
}

fn read_epoch_log(path: &Path) -> DpResult<(Vec<f64>, Vec<f64>)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if text.is_empty() {
        debug!("no logs yet in {}", path.display());
        return Ok((Vec::new(), Vec::new()));
    }

    let mut epochs = Vec::new();
    let mut values = Vec::new();
    for (idx, line) in text.lines().enumerate().skip(1) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.is_empty() {
            continue;
        }
        let malformed = |message: String| ExperimentError::MalformedLog {
            file: path.display().to_string(),
            line: idx + 1,
            message,
        };
        if cols.len() <= METRIC_COLUMN {
            return Err(malformed(format!("expected at least {} columns, found {}", METRIC_COLUMN + 1, cols.len())).into());
        }
        let parse = |col: usize| {
            cols[col]
                .parse::<f64>()
                .map_err(|e| malformed(format!("column {col} ({}): {e}", cols[col])))
        };
        epochs.push(parse(EPOCH_COLUMN)?);
        values.push(parse(METRIC_COLUMN)?);
    }
    debug!("loaded {} epochs from {}", epochs.len(), path.display());
    Ok((epochs, values))
}

/// `(finished, success)` from the raw log's trailing sentinels.
fn read_raw_log(path: &Path) -> DpResult<(bool, bool)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((false, false)),
        Err(e) => return Err(e.into()),
    };
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.len() < 2 || lines[lines.len() - 1].trim() != "done." {
        return Ok((false, false));
    }
    Ok((true, lines[lines.len() - 2].trim() == "finished."))
}

/// Load every trial directory under a sweep root, ordered by path.
/// Directories without a changed-parameters record are not trials and are
/// skipped.
pub fn scan_experiments<P: AsRef<Path>>(root: P) -> DpResult<Vec<HyperparamExperiment>> {
    let root = root.as_ref();
    let mut experiments = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if !path.join(CHANGED_PARAMS_FILE).is_file() {
            debug!("skipping {}: not a trial directory", path.display());
            continue;
        }
        experiments.push(HyperparamExperiment::load(&path)?);
    }
    experiments.sort();
    info!("found {} trials under {}", experiments.len(), root.display());
    Ok(experiments)
}

/// Sort best-first by the monitored metric; trials without data go last.
pub fn rank_experiments(experiments: &mut [HyperparamExperiment]) {
    experiments.sort_by(|a, b| match (a.best(), b.best()) {
        (Some((va, _)), Some((vb, _))) => cmp_metric(vb, va).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}
