//! Named per-batch statistic arrays returned by an evaluation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MetricError, PersistError};
use crate::metric::EvaluationMode;
use crate::output::write_pretty;

/// One numeric result column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Column(#[serde(with = "crate::output::lossy::float_vec")] pub Vec<f64>);

/// Output of one metric evaluation: one value per batch, per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Name of the statistic.
    pub metric: String,
    /// Evaluation mode.
    pub mode: EvaluationMode,
    /// Points per batch.
    pub batch_size: usize,
    /// Result columns by name.
    pub columns: BTreeMap<String, Column>,
}

impl ResultSet {
    /// Empty result set.
    pub fn new(metric: impl Into<String>, mode: EvaluationMode, batch_size: usize) -> Self {
        Self {
            metric: metric.into(),
            mode,
            batch_size,
            columns: BTreeMap::new(),
        }
    }

    /// Add or replace a column.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<f64>) {
        self.columns.insert(key.into(), Column(values));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_column(mut self, key: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(key, values);
        self
    }

    /// Values of column `key`.
    pub fn get(&self, key: &str) -> Result<&[f64], MetricError> {
        self.columns
            .get(key)
            .map(|c| c.0.as_slice())
            .ok_or_else(|| MetricError::MissingColumn(key.to_string()))
    }

    /// Arithmetic mean of column `key`.
    pub fn column_mean(&self, key: &str) -> Result<f64, MetricError> {
        let values = self.get(key)?;
        if values.is_empty() {
            return Err(MetricError::EmptyColumn(key.to_string()));
        }
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Number of batches in the longest column.
    pub fn len(&self) -> usize {
        self.columns.values().map(|c| c.0.len()).max().unwrap_or(0)
    }

    /// Whether no column holds any value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the result set to `path` as JSON, overwriting it.
    pub fn save_to_json(&self, path: &Path) -> Result<(), PersistError> {
        write_pretty(path, self)
    }
}
