//! FFT computation using rustfft
//!
//! Pre-planned forward transforms shared by the Welch estimator and the
//! amplitude spectra used by the modal fatigue model.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::AmplitudeSpectrum;
use crate::error::{FatigueError, Result};

// ============================================================================
// FFT Processor (Pre-planned for repeated use)
// ============================================================================

/// FFT processor with a pre-planned transform of fixed length.
///
/// The plan is shared, so one processor can serve every pixel of a field
/// from any worker thread.
#[derive(Clone)]
pub struct FftProcessor {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    sampling_rate: f64,
}

impl std::fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .field("sampling_rate", &self.sampling_rate)
            .finish_non_exhaustive()
    }
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `size` - FFT length (used as-is, no padding)
    /// * `sampling_rate` - Sampling rate in Hz
    pub fn new(size: usize, sampling_rate: f64) -> Result<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(FatigueError::Spectral(format!(
                "invalid sampling rate: {sampling_rate}"
            )));
        }
        if size < 2 {
            return Err(FatigueError::Spectral(format!(
                "FFT length must be at least 2, got {size}"
            )));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        Ok(Self {
            fft,
            size,
            sampling_rate,
        })
    }

    /// Transform a buffer of exactly `size` samples in place.
    pub fn transform(&self, buffer: &mut [Complex<f64>]) -> Result<()> {
        if buffer.len() != self.size {
            return Err(FatigueError::Spectral(format!(
                "FFT buffer length {} does not match plan length {}",
                buffer.len(),
                self.size
            )));
        }
        self.fft.process(buffer);
        Ok(())
    }

    /// One-sided amplitude spectrum of a real signal.
    ///
    /// The signal must hold exactly `size` samples.
    pub fn amplitude_spectrum(&self, signal: &[f64]) -> Result<AmplitudeSpectrum> {
        let mut buffer: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.transform(&mut buffer)?;

        let n_positive = self.n_positive();
        let n = self.size as f64;
        let nyquist_bin = if self.size % 2 == 0 {
            Some(n_positive - 1)
        } else {
            None
        };

        // 2/N for one-sided spectrum (except DC and Nyquist)
        let amplitudes: Vec<f64> = buffer
            .iter()
            .take(n_positive)
            .enumerate()
            .map(|(i, c)| {
                let scale = if i == 0 || Some(i) == nyquist_bin {
                    1.0 / n
                } else {
                    2.0 / n
                };
                c.norm() * scale
            })
            .collect();

        Ok(AmplitudeSpectrum {
            frequencies: self.frequency_bins(),
            amplitudes,
            resolution: self.frequency_resolution(),
        })
    }

    /// Number of non-negative frequency bins (DC through Nyquist).
    pub const fn n_positive(&self) -> usize {
        self.size / 2 + 1
    }

    /// Get frequency bins for this FFT configuration
    pub fn frequency_bins(&self) -> Vec<f64> {
        let resolution = self.frequency_resolution();
        (0..self.n_positive())
            .map(|i| i as f64 * resolution)
            .collect()
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    /// Get the frequency resolution (Hz per bin)
    pub fn frequency_resolution(&self) -> f64 {
        self.sampling_rate / self.size as f64
    }
}

// ============================================================================
// Tests
// ============================================================================
