//! Signal processing module - spectra, spectral moments and resonance identification

mod fft;
mod spectral;
mod welch;

pub use fft::*;
pub use spectral::*;
pub use welch::*;

use serde::{Deserialize, Serialize};

use crate::error::{FatigueError, Result};
use crate::types::BandPass;

/// One-sided power spectral density (MPa²/Hz) on a uniform frequency grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Frequency bins (Hz), starting at DC
    pub frequencies: Vec<f64>,
    /// Power density at each bin
    pub power: Vec<f64>,
    /// Bin spacing (Hz)
    pub resolution: f64,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Bins whose frequency lies inside the band (inclusive).
    pub fn in_band<'a>(&'a self, band: &'a BandPass) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.frequencies
            .iter()
            .zip(self.power.iter())
            .filter(|(&f, _)| band.contains(f))
            .map(|(&f, &p)| (f, p))
    }

    /// Maximum-power bin within the band; the lowest frequency wins ties.
    pub fn peak_in_band(&self, band: &BandPass) -> Option<SpectralPeak> {
        self.in_band(band)
            .fold(None, |best: Option<(f64, f64)>, (f, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((f, p)),
            })
            .map(|(frequency, power)| SpectralPeak { frequency, power })
    }

    pub fn moments(&self) -> SpectralMoments {
        SpectralMoments::from_spectrum(self)
    }
}

/// One-sided amplitude spectrum (MPa) of a full-length FFT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeSpectrum {
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
    pub resolution: f64,
}

impl AmplitudeSpectrum {
    /// Bins within `[center - span, center + span]`.
    pub fn window(&self, center: f64, span: f64) -> impl Iterator<Item = (f64, f64)> + '_ {
        let (low, high) = (center - span, center + span);
        self.frequencies
            .iter()
            .zip(self.amplitudes.iter())
            .filter(move |(&f, _)| f >= low && f <= high)
            .map(|(&f, &a)| (f, a))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    /// Hz
    pub frequency: f64,
    /// PSD value at the peak (MPa²/Hz)
    pub power: f64,
}

// ============================================================================
// Spectral Moments
// ============================================================================

/// Spectral moments `m_n = Σ f^n · P(f) · Δf` with `f` in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectralMoments {
    pub m0: f64,
    pub m1: f64,
    pub m2: f64,
    pub m4: f64,
}

impl SpectralMoments {
    pub fn from_spectrum(spectrum: &PowerSpectrum) -> Self {
        let df = spectrum.resolution;
        let mut moments = Self::default();
        for (&f, &p) in spectrum.frequencies.iter().zip(spectrum.power.iter()) {
            let w = p * df;
            let f2 = f * f;
            moments.m0 += w;
            moments.m1 += f * w;
            moments.m2 += f2 * w;
            moments.m4 += f2 * f2 * w;
        }
        moments
    }

    /// Variance of the process.
    pub const fn variance(&self) -> f64 {
        self.m0
    }

    /// No usable spectral content: zero variance or no curvature.
    pub fn is_degenerate(&self) -> bool {
        !(self.m0 > 0.0 && self.m2 > 0.0 && self.m4 > 0.0)
    }

    /// Expected rate of upward mean crossings `ν0 = sqrt(m2/m0)` (Hz).
    pub fn zero_crossing_rate(&self) -> f64 {
        (self.m2 / self.m0).sqrt()
    }

    /// Expected rate of peaks `νp = sqrt(m4/m2)` (Hz).
    pub fn peak_rate(&self) -> f64 {
        (self.m4 / self.m2).sqrt()
    }

    /// Bandwidth parameter `α1 = m1 / sqrt(m0·m2)`.
    pub fn alpha1(&self) -> f64 {
        self.m1 / (self.m0 * self.m2).sqrt()
    }

    /// Irregularity factor `α2 = m2 / sqrt(m0·m4)`.
    pub fn alpha2(&self) -> f64 {
        self.m2 / (self.m0 * self.m4).sqrt()
    }

    /// Amplitude of the sinusoid carrying the same variance, `sqrt(2·m0)`.
    pub fn equivalent_amplitude(&self) -> f64 {
        (2.0 * self.m0).sqrt()
    }
}

/// Result of a spectral analysis of one representative series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralDescriptor {
    pub spectrum: PowerSpectrum,
    /// Identified resonant frequency (Hz)
    pub frequency: f64,
    /// PSD value at the resonant frequency
    pub peak_power: f64,
    pub moments: SpectralMoments,
}

/// Peak-to-peak range of a series after rejecting non-finite samples.
///
/// A zero range marks a degenerate (constant) signal.
pub fn peak_to_peak(series: &[f64]) -> Result<f64> {
    if series.iter().any(|x| !x.is_finite()) {
        return Err(FatigueError::NonFiniteSignal);
    }
    let (min, max) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if series.is_empty() {
        return Ok(0.0);
    }
    Ok(max - min)
}
