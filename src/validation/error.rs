//! Error and degradation types
//!
//! Nothing on the per-frame path returns `ConfigError`; it only surfaces
//! from loading and saving configuration. Per-frame problems are reported
//! as a `Degradation`, logged and counted, and the filter keeps running.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading and saving failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse filter configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no file path set for saving configuration")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A recoverable per-frame problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Degradation {
    /// Innovation covariance could not be inverted reliably; prior kept
    #[error("singular innovation covariance (condition {condition_number:.3e}), update skipped")]
    SingularInnovation { condition_number: f64 },

    /// Measurement contained NaN or infinity and was dropped
    #[error("non-finite measurement rejected on axis {axis}")]
    NonFiniteMeasurement { axis: usize },

    /// Estimator state went non-finite and was re-initialised
    #[error("estimator state diverged, filter reset")]
    Diverged,
}

impl Degradation {
    /// Short name used as a log target and counter key
    pub fn kind(&self) -> &'static str {
        match self {
            Degradation::SingularInnovation { .. } => "singular_innovation",
            Degradation::NonFiniteMeasurement { .. } => "non_finite_measurement",
            Degradation::Diverged => "diverged",
        }
    }
}
