//! Modal (equivalent sinusoid) damage model
//!
//! The stress at a resonating point is treated as a sinusoid at the
//! resonant frequency. By default its amplitude is the one carrying the
//! measured variance, `sqrt(2·m0)`. With a frequency span the damage is
//! summed over every amplitude-spectrum line within `f ± span`.

use super::models::{basquin_damage, life_from_rate};
use crate::error::{FatigueError, Result};
use crate::processing::{AmplitudeSpectrum, SpectralMoments};
use crate::types::FatigueCurveParams;

/// Reject non-positive or non-finite resonant frequencies.
pub fn check_frequency(frequency: f64) -> Result<()> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(FatigueError::InvalidFrequency(frequency));
    }
    Ok(())
}

/// Reject spans that select nothing; `0` is an explicit error.
pub fn check_span(span: f64) -> Result<()> {
    if !span.is_finite() || span <= 0.0 {
        return Err(FatigueError::InvalidFrequencySpan(span));
    }
    Ok(())
}

/// Damage rate of the variance-equivalent sinusoid at `frequency`.
pub fn modal_damage_rate(
    moments: &SpectralMoments,
    frequency: f64,
    params: &FatigueCurveParams,
) -> f64 {
    frequency * basquin_damage(moments.equivalent_amplitude(), params)
}

pub fn modal_life(moments: &SpectralMoments, frequency: f64, params: &FatigueCurveParams) -> f64 {
    life_from_rate(modal_damage_rate(moments, frequency, params))
}

/// Damage rate summed over the spectral lines within `frequency ± span`,
/// each line cycling at its own frequency.
pub fn modal_span_damage_rate(
    spectrum: &AmplitudeSpectrum,
    frequency: f64,
    span: f64,
    params: &FatigueCurveParams,
) -> Result<f64> {
    check_frequency(frequency)?;
    check_span(span)?;

    let mut lines = 0usize;
    let rate: f64 = spectrum
        .window(frequency, span)
        .inspect(|_| lines += 1)
        .map(|(f, amplitude)| f * basquin_damage(amplitude, params))
        .sum();

    if lines == 0 {
        return Err(FatigueError::InvalidBand {
            low: frequency - span,
            high: frequency + span,
            reason: format!(
                "no spectral line inside the modal window (resolution {:.4} Hz)",
                spectrum.resolution
            ),
        });
    }

    Ok(rate)
}

pub fn modal_span_life(
    spectrum: &AmplitudeSpectrum,
    frequency: f64,
    span: f64,
    params: &FatigueCurveParams,
) -> Result<f64> {
    Ok(life_from_rate(modal_span_damage_rate(
        spectrum, frequency, span, params,
    )?))
}
