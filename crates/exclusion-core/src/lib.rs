//! Search machinery for exclusion-limit estimation.
//!
//! This crate holds the pure numerics of the bisection solver: the search
//! interval, probe placement (fixed or adaptive division factor), the two
//! relative-error convergence criteria, empirical-quantile threshold tables
//! and the multi-tier driver, plus serde helpers for non-finite floats. It
//! knows nothing about distributions, metrics or files; callers plug those in
//! through [`search::Probe`].
//!
//! ```ignore
//! use exclusion_core::{run_search, FnProbe, SearchSettings, StepPolicy, ThresholdTier};
//!
//! let tiers = [ThresholdTier::new(0.95, 1.0)];
//! let mut probe = FnProbe::new(&tiers, |eps| 5.0 * eps);
//! let trace = run_search(settings, tiers.len(), &mut probe, |_| {})?;
//! ```

pub mod constants;
pub mod convergence;
pub mod interval;
pub mod lossy;
pub mod search;
pub mod step;
pub mod threshold;
pub mod tier;

// Re-export commonly used items at crate root
pub use convergence::{relative_error_metric, ConvergenceTracker, Tolerances};
pub use interval::SearchInterval;
pub use search::{run_search, Crossing, FnProbe, Probe, Probed, SearchEvent, SearchTrace};
pub use step::{StepController, StepPolicy};
pub use threshold::{build_threshold_table, empirical_quantile_sorted, quantile_index, ThresholdTier};
pub use tier::{Observation, SearchSettings, TierSearch};
