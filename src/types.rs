//! Shared value types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which mixture parameters the search epsilon perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeformationMode {
    /// Component locations only.
    Mean,
    /// Component scales only.
    Std,
    /// Locations and scales, by the same epsilon.
    Both,
}

impl DeformationMode {
    /// Perturbation applied at search point `eps`.
    pub fn perturbation(self, eps: f64) -> Perturbation {
        match self {
            DeformationMode::Mean => Perturbation {
                eps_loc: eps,
                eps_scale: 0.0,
            },
            DeformationMode::Std => Perturbation {
                eps_loc: 0.0,
                eps_scale: eps,
            },
            DeformationMode::Both => Perturbation {
                eps_loc: eps,
                eps_scale: eps,
            },
        }
    }

    /// Lowercase name used in file names and stores.
    pub fn as_str(self) -> &'static str {
        match self {
            DeformationMode::Mean => "mean",
            DeformationMode::Std => "std",
            DeformationMode::Both => "both",
        }
    }
}

impl fmt::Display for DeformationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeformationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(DeformationMode::Mean),
            "std" => Ok(DeformationMode::Std),
            "both" => Ok(DeformationMode::Both),
            other => Err(ConfigError::UnknownDeformationMode(other.to_string())),
        }
    }
}

/// Half-widths of the uniform perturbation applied to a mixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    /// Applied to component locations.
    pub eps_loc: f64,
    /// Applied to component scales.
    pub eps_scale: f64,
}

impl Perturbation {
    /// No perturbation: the reference distribution.
    pub const NONE: Perturbation = Perturbation {
        eps_loc: 0.0,
        eps_scale: 0.0,
    };
}
