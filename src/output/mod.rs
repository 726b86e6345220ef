//! Persistence of search results.
//!
//! - `store`: merge-on-write JSON stores and the run store
//! - `metrics_config`: metric configurations with their threshold history
//! - `null_file`: per-probe null result file names
//! - `lossy`: serde helpers for non-finite floats (from `exclusion_core`)
//! - JSON serialization of single runs

mod json;
mod metrics_config;
mod null_file;
mod store;

pub use exclusion_core::lossy;
pub use json::{to_json, to_json_pretty};
pub(crate) use json::write_pretty;
pub use metrics_config::{load_metrics_config, save_metrics_config};
pub use null_file::null_file_path;
pub use store::{load_object, merge_entry, persist_run, ExclusionStore};
