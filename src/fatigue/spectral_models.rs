//! Closed-form spectral damage models
//!
//! All models take the spectral moments of a stationary Gaussian stress
//! process and return a damage rate (1/s) under the Basquin curve applied
//! to the stress amplitude. Amplitudes below the endurance limit are cut
//! out of the integrals through the incomplete gamma function.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{exponential_moment, life_from_rate, rayleigh_moment};
use crate::processing::SpectralMoments;
use crate::types::FatigueCurveParams;

// ============================================================================
// Narrow-band (Rayleigh) reference
// ============================================================================

/// Narrow-band damage rate: one Rayleigh-distributed cycle per upward
/// mean crossing.
pub fn narrow_band_damage_rate(moments: &SpectralMoments, params: &FatigueCurveParams) -> f64 {
    if moments.is_degenerate() {
        return 0.0;
    }
    let sigma = moments.m0.sqrt();
    moments.zero_crossing_rate()
        * rayleigh_moment(sigma, params.slope_k, params.threshold())
        / params.strength_c
}

pub fn narrow_band_life(moments: &SpectralMoments, params: &FatigueCurveParams) -> f64 {
    life_from_rate(narrow_band_damage_rate(moments, params))
}

// ============================================================================
// Dirlik
// ============================================================================

/// Weights and shape parameters of the Dirlik amplitude distribution
/// (amplitudes normalised by `sqrt(m0)`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirlikCoefficients {
    pub g1: f64,
    pub g2: f64,
    pub g3: f64,
    pub r: f64,
    pub q: f64,
}

impl DirlikCoefficients {
    /// `None` when the moments do not yield a usable distribution.
    pub fn from_moments(moments: &SpectralMoments) -> Option<Self> {
        if moments.is_degenerate() {
            return None;
        }

        let xm = (moments.m1 / moments.m0) * (moments.m2 / moments.m4).sqrt();
        let gamma = moments.alpha2();
        let g2_sq = gamma * gamma;

        let g1 = 2.0 * (xm - g2_sq) / (1.0 + g2_sq);
        let r = (gamma - xm - g1 * g1) / (1.0 - gamma - g1 + g1 * g1);
        let g2 = (1.0 - gamma - g1 + g1 * g1) / (1.0 - r);
        let g3 = 1.0 - g1 - g2;
        let q = 1.25 * (gamma - g3 - g2 * r) / g1;

        let coefficients = Self { g1, g2, g3, r, q };
        let usable = [g1, g2, g3, r, q].iter().all(|v| v.is_finite()) && q > 0.0;
        usable.then_some(coefficients)
    }

    /// `E[s^k; s > threshold]` of the amplitude distribution for `σ = sqrt(m0)`.
    pub fn amplitude_moment(&self, sigma: f64, k: f64, threshold: f64) -> f64 {
        self.g1 * exponential_moment(self.q * sigma, k, threshold)
            + self.g2 * rayleigh_moment(self.r.abs() * sigma, k, threshold)
            + self.g3 * rayleigh_moment(sigma, k, threshold)
    }
}

/// Dirlik damage rate: Dirlik amplitude distribution at the rate of peaks.
///
/// Falls back to the narrow-band rate when the coefficients are unusable.
pub fn dirlik_damage_rate(moments: &SpectralMoments, params: &FatigueCurveParams) -> f64 {
    if moments.is_degenerate() {
        return 0.0;
    }

    let rate = DirlikCoefficients::from_moments(moments).map(|dk| {
        let expected = dk.amplitude_moment(moments.m0.sqrt(), params.slope_k, params.threshold());
        moments.peak_rate() * expected / params.strength_c
    });

    match rate {
        Some(rate) if rate.is_finite() && rate > 0.0 => rate,
        _ => {
            debug!(
                alpha2 = moments.alpha2(),
                "Dirlik coefficients unusable, falling back to narrow-band"
            );
            narrow_band_damage_rate(moments, params)
        }
    }
}

pub fn dirlik_life(moments: &SpectralMoments, params: &FatigueCurveParams) -> f64 {
    life_from_rate(dirlik_damage_rate(moments, params))
}

// ============================================================================
// Tovo-Benasciutti
// ============================================================================

/// Interpolation weight `b` of the Tovo-Benasciutti method 2, in `[0, 1]`.
pub fn tovo_benasciutti_weight(moments: &SpectralMoments) -> f64 {
    let a1 = moments.alpha1();
    let a2 = moments.alpha2();
    let denominator = (a2 - 1.0).powi(2);

    if denominator < 1e-12 {
        return 1.0;
    }

    let b = (a1 - a2)
        * (1.112 * (1.0 + a1 * a2 - (a1 + a2)) * (2.11 * a2).exp() + (a1 - a2))
        / denominator;

    if b.is_finite() {
        b.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Tovo-Benasciutti damage rate: narrow-band rate scaled by
/// `b + (1 - b)·α2^(k-1)`.
pub fn tovo_benasciutti_damage_rate(
    moments: &SpectralMoments,
    params: &FatigueCurveParams,
) -> f64 {
    if moments.is_degenerate() {
        return 0.0;
    }
    let b = tovo_benasciutti_weight(moments);
    let correction = b + (1.0 - b) * moments.alpha2().powf(params.slope_k - 1.0);
    correction * narrow_band_damage_rate(moments, params)
}

pub fn tovo_benasciutti_life(moments: &SpectralMoments, params: &FatigueCurveParams) -> f64 {
    life_from_rate(tovo_benasciutti_damage_rate(moments, params))
}
