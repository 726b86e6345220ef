//! Default values shared by the search configuration.

/// Division factor that places the probe at the interval midpoint.
///
/// The adaptive step controller never moves below this value.
pub const MIDPOINT_DIVISION_FACTOR: f64 = 0.5;

/// Default relative tolerance on the interval width.
pub const DEFAULT_X_TOL: f64 = 0.01;

/// Default relative tolerance on the metric gap to the threshold.
pub const DEFAULT_FN_TOL: f64 = 0.01;

/// Default lower bound of the epsilon search interval.
pub const DEFAULT_EPS_MIN: f64 = 0.0;

/// Default upper bound of the epsilon search interval.
pub const DEFAULT_EPS_MAX: f64 = 1.0;

/// Default probe budget per threshold tier.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default confidence levels searched by the likelihood-ratio solver.
pub const DEFAULT_CONFIDENCE_LEVELS: [f64; 2] = [0.95, 0.99];
