//! Error types.
//!
//! Non-convergence of a tier is not an error, and neither is an unreadable
//! result store; both are reported through `tracing` and the returned
//! [`RunResult`](crate::RunResult).

use std::path::PathBuf;

/// Invalid solver, test or metric configuration. Raised before any probe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown deformation mode '{0}': expected 'mean', 'std' or 'both'")]
    UnknownDeformationMode(String),

    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("Metric kind '{0}' is not registered")]
    UnregisteredMetric(String),

    #[error("Tolerances must be positive: x_tol={x_tol}, fn_tol={fn_tol}")]
    InvalidTolerances { x_tol: f64, fn_tol: f64 },

    #[error("Invalid epsilon bounds: eps_min={eps_min} must be below eps_max={eps_max}")]
    InvalidBounds { eps_min: f64, eps_max: f64 },

    #[error("Initial division factor {0} outside [0.5, 1)")]
    InvalidDivisionFactor(f64),

    #[error("Reduce division factor {0} must be >= 1")]
    InvalidReduceFactor(f64),

    #[error("Confidence level {0} outside (0, 1)")]
    InvalidConfidenceLevel(f64),

    #[error("No threshold tiers configured")]
    EmptyThresholds,

    #[error("{field} must be positive")]
    ZeroSize { field: &'static str },

    #[error("Metric scale exponent {0} is not finite")]
    InvalidScaleExponent(f64),

    #[error("Invalid value for metric option '{key}': {message}")]
    InvalidKwarg { key: String, message: String },
}

/// Failure while sampling or evaluating a metric.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricError {
    #[error("Result set has no column '{0}'")]
    MissingColumn(String),

    #[error("Result column '{0}' is empty")]
    EmptyColumn(String),

    #[error("Null-hypothesis sample is empty")]
    EmptyNullSample,

    #[error("Invalid distribution parameters: {message}")]
    InvalidDistribution { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Failure writing a store or result file.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PersistError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Any error an exclusion search can return.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Metric evaluation failed: {0}")]
    Metric(#[from] MetricError),

    #[error("Persistence failed: {0}")]
    Persist(#[from] PersistError),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::UnknownDeformationMode("shift".into());
        assert!(err.to_string().contains("'shift'"));
    }

    #[test]
    fn test_error_from_conversions() {
        let err: Error = MetricError::MissingColumn("ks_lists".into()).into();
        assert!(matches!(err, Error::Metric(MetricError::MissingColumn(_))));
        assert!(err.to_string().contains("ks_lists"));
    }
}
