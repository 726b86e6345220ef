//! Metric configuration store.
//!
//! Likelihood-ratio searches append the thresholds computed at every probe to
//! [`MetricConfig::threshold_history`] and rewrite the configuration under
//! its name, so the null-distribution quantiles of past probes can be
//! audited or reused. The in-memory configuration is the source of truth;
//! whatever was stored under the same name is replaced.

use std::path::Path;

use crate::config::MetricConfig;
use crate::error::PersistError;
use crate::output::store::{load_object, merge_entry};

/// Write `config` into the store at `path` under `config.name`.
pub fn save_metrics_config(path: &Path, config: &MetricConfig) -> Result<(), PersistError> {
    merge_entry(path, &config.name, config)?;
    tracing::debug!(
        "Saved metric config '{}' ({} threshold entries) to {}",
        config.name,
        config.threshold_history.len(),
        path.display()
    );
    Ok(())
}

/// Read the configuration stored under `name`, if present and well-formed.
pub fn load_metrics_config(path: &Path, name: &str) -> Result<Option<MetricConfig>, PersistError> {
    let mut store = load_object(path)?;
    match store.remove(name) {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| PersistError::json(path, e)),
        None => Ok(None),
    }
}
