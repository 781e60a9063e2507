//! Welch power spectral density estimate
//!
//! Periodic Hann window, per-segment mean removal, averaged periodograms,
//! one-sided density scaling `1 / (fs · Σw²)`.

use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::{FftProcessor, PowerSpectrum};
use crate::error::{FatigueError, Result};

pub const DEFAULT_SEGMENT_LENGTH: usize = 256;
pub const DEFAULT_OVERLAP: f64 = 0.5;

/// Segmenting parameters of the Welch estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelchConfig {
    /// Samples per segment (clipped to the series length)
    pub segment_length: usize,
    /// Fraction of a segment shared with the next one, in `[0, 1)`
    pub overlap: f64,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            segment_length: DEFAULT_SEGMENT_LENGTH,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl WelchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.segment_length < 2 {
            return Err(FatigueError::Spectral(format!(
                "segment length must be at least 2, got {}",
                self.segment_length
            )));
        }
        if !(0.0..1.0).contains(&self.overlap) {
            return Err(FatigueError::Spectral(format!(
                "overlap must lie in [0, 1), got {}",
                self.overlap
            )));
        }
        Ok(())
    }
}

/// Welch estimator planned for a fixed series length and sampling interval.
#[derive(Debug, Clone)]
pub struct WelchEstimator {
    processor: FftProcessor,
    window: Vec<f64>,
    n_samples: usize,
    step: usize,
    n_segments: usize,
    /// Density scale with the one-sided doubling folded in
    scale: f64,
}

impl WelchEstimator {
    pub fn new(config: WelchConfig, n_samples: usize, dt: f64) -> Result<Self> {
        config.validate()?;
        if n_samples < 2 {
            return Err(FatigueError::Spectral(format!(
                "need at least 2 samples for a PSD, got {n_samples}"
            )));
        }

        let nperseg = config.segment_length.min(n_samples);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let noverlap = ((nperseg as f64 * config.overlap).floor() as usize).min(nperseg - 1);
        let step = nperseg - noverlap;
        let n_segments = (n_samples - noverlap) / step;

        let sampling_rate = 1.0 / dt;
        let processor = FftProcessor::new(nperseg, sampling_rate)?;

        let window = hann_periodic(nperseg);
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (sampling_rate * window_power * n_segments as f64);

        tracing::trace!(nperseg, noverlap, n_segments, "Planned Welch estimate");

        Ok(Self {
            processor,
            window,
            n_samples,
            step,
            n_segments,
            scale,
        })
    }

    pub fn segment_length(&self) -> usize {
        self.window.len()
    }

    pub const fn n_segments(&self) -> usize {
        self.n_segments
    }

    pub fn resolution(&self) -> f64 {
        self.processor.frequency_resolution()
    }

    /// Estimate the one-sided PSD of `series`.
    pub fn estimate(&self, series: &[f64]) -> Result<PowerSpectrum> {
        if series.len() != self.n_samples {
            return Err(FatigueError::Spectral(format!(
                "series has {} samples, estimator planned for {}",
                series.len(),
                self.n_samples
            )));
        }

        let nperseg = self.window.len();
        let n_positive = self.processor.n_positive();
        let mut accumulated = vec![0.0; n_positive];
        let mut buffer = vec![Complex::new(0.0, 0.0); nperseg];

        for segment_idx in 0..self.n_segments {
            let start = segment_idx * self.step;
            let segment = &series[start..start + nperseg];
            let mean = segment.iter().sum::<f64>() / nperseg as f64;

            for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&self.window) {
                *slot = Complex::new((x - mean) * w, 0.0);
            }
            self.processor.transform(&mut buffer)?;

            for (acc, c) in accumulated.iter_mut().zip(&buffer) {
                *acc += c.norm_sqr();
            }
        }

        let has_nyquist = nperseg % 2 == 0;
        let power: Vec<f64> = accumulated
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let one_sided = i == 0 || (has_nyquist && i == n_positive - 1);
                if one_sided {
                    p * self.scale
                } else {
                    2.0 * p * self.scale
                }
            })
            .collect();

        Ok(PowerSpectrum {
            frequencies: self.processor.frequency_bins(),
            power,
            resolution: self.resolution(),
        })
    }
}

/// Periodic Hann window `w[i] = 0.5 - 0.5·cos(2πi/N)`.
fn hann_periodic(len: usize) -> Vec<f64> {
    let n = len as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(amplitude: f64, freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_hann_window_shape() {
        let w = hann_periodic(8);
        assert!(w[0].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        assert!((w[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_segmenting() {
        let welch = WelchEstimator::new(WelchConfig::default(), 4000, 1.0 / 400.0).unwrap();
        assert_eq!(welch.segment_length(), 256);
        // (4000 - 128) / 128
        assert_eq!(welch.n_segments(), 30);
        assert!((welch.resolution() - 1.5625).abs() < 1e-12);

        // Short series collapse to a single full-length segment
        let short = WelchEstimator::new(WelchConfig::default(), 100, 0.01).unwrap();
        assert_eq!(short.segment_length(), 100);
        assert_eq!(short.n_segments(), 1);
    }

    #[test]
    fn test_bin_exact_tone_preserves_variance() {
        let fs = 400.0;
        let signal = sine(20.0, 50.0, fs, 4000);
        let welch = WelchEstimator::new(WelchConfig::default(), signal.len(), 1.0 / fs).unwrap();
        let psd = welch.estimate(&signal).unwrap();

        let moments = psd.moments();
        // Variance of a sine is A²/2
        assert!((moments.m0 - 200.0).abs() / 200.0 < 1e-6);

        let peak_idx = psd
            .power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!((psd.frequencies[peak_idx] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_is_removed() {
        let fs = 400.0;
        let signal: Vec<f64> = sine(1.0, 50.0, fs, 1024)
            .into_iter()
            .map(|x| x + 100.0)
            .collect();
        let welch = WelchEstimator::new(WelchConfig::default(), signal.len(), 1.0 / fs).unwrap();
        let psd = welch.estimate(&signal).unwrap();
        assert!(psd.power[0] < 1e-9);
    }

    #[test]
    fn test_rejects_bad_config_and_length() {
        let bad = WelchConfig {
            segment_length: 256,
            overlap: 1.0,
        };
        assert!(WelchEstimator::new(bad, 1000, 0.01).is_err());

        let welch = WelchEstimator::new(WelchConfig::default(), 1000, 0.01).unwrap();
        assert!(welch.estimate(&[0.0; 999]).is_err());
    }
}
