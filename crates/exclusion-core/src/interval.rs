//! Epsilon search interval.

use serde::{Deserialize, Serialize};

/// Closed interval `[eps_min, eps_max]` that brackets a threshold crossing.
///
/// Within one tier the interval only ever narrows: every probe lies inside
/// the current bounds and replaces exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchInterval {
    /// Largest epsilon known to stay at or below the threshold.
    pub eps_min: f64,
    /// Smallest epsilon known to exceed the threshold.
    pub eps_max: f64,
}

impl SearchInterval {
    /// Create an interval from its bounds.
    pub fn new(eps_min: f64, eps_max: f64) -> Self {
        debug_assert!(eps_min <= eps_max, "eps_min must not exceed eps_max");
        Self { eps_min, eps_max }
    }

    /// Interval width `eps_max - eps_min`.
    pub fn width(&self) -> f64 {
        self.eps_max - self.eps_min
    }

    /// Arithmetic midpoint.
    pub fn midpoint(&self) -> f64 {
        (self.eps_max + self.eps_min) / 2.0
    }

    /// Relative width `2 (eps_max - eps_min) / (eps_max + eps_min)`.
    ///
    /// Not guarded against `eps_max + eps_min == 0`; the result is then
    /// NaN or infinite and every tolerance comparison fails.
    pub fn relative_width(&self) -> f64 {
        2.0 * (self.eps_max - self.eps_min) / (self.eps_max + self.eps_min)
    }

    /// Whether `eps` lies inside the closed interval.
    pub fn contains(&self, eps: f64) -> bool {
        eps >= self.eps_min && eps <= self.eps_max
    }

    /// The probe overshot the threshold: it becomes the new upper bound.
    pub fn lower_ceiling(&mut self, eps: f64) {
        self.eps_max = eps;
    }

    /// The probe stayed at or below the threshold: it becomes the new lower bound.
    pub fn raise_floor(&mut self, eps: f64) {
        self.eps_min = eps;
    }

    /// Point at `fraction` of the width, measured down from `eps_max`.
    pub fn from_ceiling(&self, fraction: f64) -> f64 {
        self.eps_max - self.width() * fraction
    }

    /// Point at `fraction` of the width, measured up from `eps_min`.
    pub fn from_floor(&self, fraction: f64) -> f64 {
        self.eps_min + self.width() * fraction
    }
}
