//! Shared data structures for fatigue life identification
//!
//! - `StressField`, `Location`, `BandPass`: the stress input and how to address it
//! - `FatigueCurveParams`, `FatigueModel`, `EstimateOptions`: what to estimate
//! - `FatigueResult`: a scalar life for one location or a life map for the field

mod fatigue;
mod field;

pub use fatigue::*;
pub use field::*;

use serde::Serialize;

use crate::spatial::LifeMap;

/// Outcome of [`crate::fatigue::FatigueEstimator::estimate_life`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FatigueResult {
    /// Life in seconds for one location, or [`INFINITE_LIFE`]
    Scalar(f64),
    /// Per-pixel lives covering the whole field
    Map(LifeMap),
}

impl FatigueResult {
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(life) => Some(*life),
            Self::Map(_) => None,
        }
    }

    pub const fn as_map(&self) -> Option<&LifeMap> {
        match self {
            Self::Scalar(_) => None,
            Self::Map(map) => Some(map),
        }
    }

    pub fn into_map(self) -> Option<LifeMap> {
        match self {
            Self::Scalar(_) => None,
            Self::Map(map) => Some(map),
        }
    }
}
