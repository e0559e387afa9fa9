use thiserror::Error;

/// Main error type for the disruption-prediction toolkit
#[derive(Error, Debug)]
pub enum DpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    #[error("Hyperparameter error: {0}")]
    Hyperparam(#[from] HyperparamError),

    #[error("Experiment error: {0}")]
    Experiment(#[from] ExperimentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DpError {
    /// Fatal configuration errors terminate the process with status 1
    /// instead of being retried.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            DpError::Config(ConfigError::UnknownTarget { .. })
                | DpError::Config(ConfigError::UnknownDataset { .. })
        )
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown type of target: {target}")]
    UnknownTarget { target: String },

    #[error("Unknown dataset {dataset}")]
    UnknownDataset { dataset: String },

    #[error("Missing configuration entry: {key}")]
    MissingEntry { key: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Could not determine the current user name")]
    UnknownUser,

    #[error("{0}")]
    Other(String),
}

/// Target strategy errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetError {
    #[error("Warning window must be strictly positive, got {t_warning}")]
    NonPositiveWarning { t_warning: f64 },

    #[error("Length mismatch: y_true has {expected} values, y_pred has {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Hyperparameter sampling errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HyperparamError {
    #[error("Grid for {path} exhausted after {count} values")]
    Exhausted { path: String, count: usize },

    #[error("Invalid bounds for {path}: lo={lo}, hi={hi}")]
    InvalidBounds { path: String, lo: f64, hi: f64 },

    #[error("No values to choose from for {path}")]
    EmptyChoices { path: String },

    #[error("Hyperparameter path must not be empty")]
    EmptyPath,

    #[error("Configuration path {path} does not resolve: {message}")]
    InvalidPath { path: String, message: String },

    #[error("Configuration entry not found: {path}")]
    MissingEntry { path: String },
}

/// Trial directory / log parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExperimentError {
    #[error("Malformed epoch log {file} at line {line}: {message}")]
    MalformedLog {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Not a trial directory: {path}")]
    NotATrial { path: String },
}

/// Result type alias for toolkit operations
pub type DpResult<T> = Result<T, DpError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::DpError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::DpError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::DpError::Config($crate::ConfigError::Other(format!($($arg)*)))
    };
}
