//! Fatigue curve parameters, model selection and estimation options

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Location;
use crate::error::{FatigueError, Result};

/// Life reported for a zero-damage signal (constant series, amplitudes below
/// the endurance limit).
pub const INFINITE_LIFE: f64 = f64::INFINITY;

/// Value stored in full-field maps for pixels whose evaluation failed.
pub const FAILED_LIFE: f64 = f64::NAN;

// ============================================================================
// Fatigue Curve
// ============================================================================

/// Basquin S-N curve `N = C / s^k` on stress amplitude `s`, with an optional
/// endurance limit below which cycles do no damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueCurveParams {
    /// S-N curve slope `k` (> 1)
    pub slope_k: f64,
    /// Fatigue-strength coefficient `C` (MPa^k)
    pub strength_c: f64,
    /// Endurance limit `B` (MPa amplitude)
    #[serde(default)]
    pub endurance_limit: Option<f64>,
}

impl FatigueCurveParams {
    pub fn new(slope_k: f64, strength_c: f64) -> Result<Self> {
        let params = Self {
            slope_k,
            strength_c,
            endurance_limit: None,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_endurance_limit(self, limit: f64) -> Result<Self> {
        let params = Self {
            endurance_limit: Some(limit),
            ..self
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.slope_k.is_finite() || self.slope_k <= 1.0 {
            return Err(FatigueError::InvalidCurveParams(format!(
                "slope k must be a finite number > 1, got {}",
                self.slope_k
            )));
        }
        if !self.strength_c.is_finite() || self.strength_c <= 0.0 {
            return Err(FatigueError::InvalidCurveParams(format!(
                "strength coefficient C must be a finite number > 0, got {}",
                self.strength_c
            )));
        }
        if let Some(limit) = self.endurance_limit {
            if !limit.is_finite() || limit < 0.0 {
                return Err(FatigueError::InvalidCurveParams(format!(
                    "endurance limit B must be a finite number >= 0, got {limit}"
                )));
            }
        }
        Ok(())
    }

    /// Endurance limit, zero when unset.
    pub fn threshold(&self) -> f64 {
        self.endurance_limit.unwrap_or(0.0)
    }

    /// Cycles to failure at a given stress amplitude (Basquin).
    ///
    /// Infinite for zero amplitude or amplitudes below the endurance limit.
    pub fn cycles_to_failure(&self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 || amplitude < self.threshold() {
            return INFINITE_LIFE;
        }
        self.strength_c / amplitude.powf(self.slope_k)
    }
}

// ============================================================================
// Model Selection
// ============================================================================

/// Closed set of damage models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FatigueModel {
    /// Time-domain rainflow counting with Palmgren-Miner summation
    Rainflow,
    /// Dirlik empirical range distribution
    Dirlik,
    /// Tovo-Benasciutti bandwidth-corrected narrow-band damage
    #[default]
    TovoBenasciutti,
    /// Equivalent sinusoid at the resonant frequency
    Modal,
}

impl FatigueModel {
    pub const ALL: [Self; 4] = [
        Self::Rainflow,
        Self::Dirlik,
        Self::TovoBenasciutti,
        Self::Modal,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rainflow => "Rainflow",
            Self::Dirlik => "Dirlik",
            Self::TovoBenasciutti => "TovoBenasciutti",
            Self::Modal => "Modal",
        }
    }

    pub const fn requires_frequency(self) -> bool {
        matches!(self, Self::Modal)
    }
}

impl fmt::Display for FatigueModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FatigueModel {
    type Err = FatigueError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "rainflow" | "rf" => Ok(Self::Rainflow),
            "dirlik" | "dk" => Ok(Self::Dirlik),
            "tovobenasciutti" | "tb" => Ok(Self::TovoBenasciutti),
            "modal" => Ok(Self::Modal),
            _ => Err(FatigueError::UnknownModel(s.to_string())),
        }
    }
}

impl TryFrom<String> for FatigueModel {
    type Error = FatigueError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// How a multi-pixel location is reduced to one life value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMode {
    /// Average the region into one series, then evaluate it once
    #[default]
    MeanSeries,
    /// Evaluate every pixel of the region and average the lives
    MeanLife,
}

// ============================================================================
// Estimation Options
// ============================================================================

/// Per-call options for [`crate::fatigue::FatigueEstimator::estimate_life`].
///
/// Without a location the estimate is computed for every pixel of the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateOptions {
    #[serde(default)]
    pub location: Option<Location>,
    /// Resonant frequency (Hz), required by the modal model
    #[serde(default)]
    pub frequency: Option<f64>,
    /// Half-width (Hz) of the spectral window summed by the modal model
    #[serde(default)]
    pub modal_span: Option<f64>,
    #[serde(default)]
    pub region_mode: RegionMode,
}

impl EstimateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub const fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub const fn with_modal_span(mut self, span: f64) -> Self {
        self.modal_span = Some(span);
        self
    }

    #[must_use]
    pub const fn with_region_mode(mut self, mode: RegionMode) -> Self {
        self.region_mode = mode;
        self
    }
}
