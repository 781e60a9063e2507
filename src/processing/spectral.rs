//! Resonance identification on a representative stress series
//!
//! A region of the field is averaged into one series, its Welch PSD is
//! restricted to a band and the frequency of maximum power is reported.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    peak_to_peak, PowerSpectrum, SpectralDescriptor, SpectralMoments, SpectralPeak, WelchConfig,
    WelchEstimator,
};
use crate::error::{FatigueError, Result};
use crate::types::{pick_location, BandPass, Location, PixelPicker, StressField};

/// Side of the square region averaged around a picked pixel.
pub const DEFAULT_ROI_SIZE: usize = 5;

/// Spectral front end shared by the resonance search and the spectral
/// fatigue models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralAnalyzer {
    welch: WelchConfig,
    roi_size: usize,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self {
            welch: WelchConfig::default(),
            roi_size: DEFAULT_ROI_SIZE,
        }
    }
}

impl SpectralAnalyzer {
    pub fn new(welch: WelchConfig, roi_size: usize) -> Result<Self> {
        welch.validate()?;
        if roi_size == 0 {
            return Err(FatigueError::InvalidLocation(
                "roi_size must be at least 1 pixel".to_string(),
            ));
        }
        Ok(Self { welch, roi_size })
    }

    pub const fn welch_config(&self) -> WelchConfig {
        self.welch
    }

    pub const fn roi_size(&self) -> usize {
        self.roi_size
    }

    /// Welch estimator for series of `n_samples` sampled every `dt` seconds.
    pub fn estimator(&self, n_samples: usize, dt: f64) -> Result<WelchEstimator> {
        WelchEstimator::new(self.welch, n_samples, dt)
    }

    pub fn power_spectrum(&self, series: &[f64], dt: f64) -> Result<PowerSpectrum> {
        self.estimator(series.len(), dt)?.estimate(series)
    }

    /// Spectral moments `(m0, m1, m2, m4)` of a series.
    pub fn spectral_moments(&self, series: &[f64], dt: f64) -> Result<SpectralMoments> {
        Ok(self.power_spectrum(series, dt)?.moments())
    }

    /// Explicit band checked against Nyquist, or the whole spectrum.
    pub fn resolve_band(band: Option<BandPass>, nyquist: f64) -> Result<BandPass> {
        match band {
            Some(band) => {
                band.validate_for(nyquist)?;
                Ok(band)
            }
            None => Ok(BandPass::full(nyquist)),
        }
    }

    /// Full analysis of one region: PSD, resonant peak and moments.
    ///
    /// Without a location the whole field of view is averaged.
    pub fn describe(
        &self,
        field: &StressField,
        location: Option<Location>,
        band: Option<BandPass>,
    ) -> Result<SpectralDescriptor> {
        let location = location.unwrap_or_else(|| field.full_frame());
        let band = Self::resolve_band(band, field.nyquist())?;
        let series = field.region_mean_series(&location)?;

        if peak_to_peak(&series)? == 0.0 {
            return Err(FatigueError::DegenerateSignal(format!(
                "constant series in region {}x{} at ({}, {})",
                location.height, location.width, location.row, location.col
            )));
        }

        let spectrum = self.power_spectrum(&series, field.dt())?;
        let peak = spectrum
            .peak_in_band(&band)
            .ok_or_else(|| FatigueError::InvalidBand {
                low: band.low(),
                high: band.high(),
                reason: format!(
                    "no PSD bin inside the band (resolution {:.3} Hz)",
                    spectrum.resolution
                ),
            })?;
        let moments = spectrum.moments();

        debug!(
            bins = spectrum.len(),
            resolution = spectrum.resolution,
            m0 = moments.m0,
            "Computed region PSD"
        );
        info!(
            frequency = peak.frequency,
            power = peak.power,
            band_low = band.low(),
            band_high = band.high(),
            "Identified resonant frequency"
        );

        Ok(SpectralDescriptor {
            spectrum,
            frequency: peak.frequency,
            peak_power: peak.power,
            moments,
        })
    }

    /// Resonant peak (frequency and PSD value) within the band.
    pub fn identify_peak(
        &self,
        field: &StressField,
        location: Option<Location>,
        band: Option<BandPass>,
    ) -> Result<SpectralPeak> {
        let descriptor = self.describe(field, location, band)?;
        Ok(SpectralPeak {
            frequency: descriptor.frequency,
            power: descriptor.peak_power,
        })
    }

    /// Resonant frequency (Hz) within the band.
    pub fn identify_frequency(
        &self,
        field: &StressField,
        location: Option<Location>,
        band: Option<BandPass>,
    ) -> Result<f64> {
        Ok(self.identify_peak(field, location, band)?.frequency)
    }

    /// Resonant peak of the ROI around a pixel chosen by `picker`.
    pub fn identify_picked<P: PixelPicker + ?Sized>(
        &self,
        field: &StressField,
        picker: &mut P,
        band: Option<BandPass>,
    ) -> Result<SpectralPeak> {
        let location = pick_location(picker, field, self.roi_size)?;
        debug!(
            row = location.row,
            col = location.col,
            size = self.roi_size,
            "Using picked region"
        );
        self.identify_peak(field, Some(location), band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use std::f64::consts::PI;

    /// 2x3 field vibrating at `freq` with a pixel-dependent amplitude.
    fn resonant_field(freq: f64, fs: f64, n: usize) -> StressField {
        let data = Array3::from_shape_fn((n, 2, 3), |(t, r, c)| {
            let amplitude = 1.0 + (r * 3 + c) as f64;
            amplitude * (2.0 * PI * freq * t as f64 / fs).sin()
        });
        StressField::new(data, 1.0 / fs).unwrap()
    }

    struct CornerPicker;

    impl PixelPicker for CornerPicker {
        fn pick(&mut self, _field: &StressField) -> Option<(usize, usize)> {
            Some((1, 2))
        }
    }

    #[test]
    fn test_identify_in_band() {
        let field = resonant_field(50.0, 400.0, 2048);
        let analyzer = SpectralAnalyzer::default();
        let band = BandPass::new(40.0, 60.0).unwrap();

        let freq = analyzer
            .identify_frequency(&field, Some(Location::pixel(0, 1)), Some(band))
            .unwrap();
        assert!((freq - 50.0).abs() <= 1.5625);
    }

    #[test]
    fn test_full_spectrum_without_band() {
        let field = resonant_field(75.0, 400.0, 2048);
        let analyzer = SpectralAnalyzer::default();
        let freq = analyzer.identify_frequency(&field, None, None).unwrap();
        assert!((freq - 75.0).abs() <= 1.5625);
    }

    #[test]
    fn test_band_errors() {
        let field = resonant_field(50.0, 400.0, 1024);
        let analyzer = SpectralAnalyzer::default();

        let above_nyquist = BandPass::new(0.0, 10_000.0).unwrap();
        let err = analyzer
            .identify_frequency(&field, None, Some(above_nyquist))
            .unwrap_err();
        assert!(matches!(err, FatigueError::InvalidBand { .. }));

        // Narrower than one bin, between two bins
        let empty = BandPass::new(50.1, 50.2).unwrap();
        let err = analyzer
            .identify_frequency(&field, None, Some(empty))
            .unwrap_err();
        assert!(matches!(err, FatigueError::InvalidBand { .. }));
    }

    #[test]
    fn test_location_errors() {
        let field = resonant_field(50.0, 400.0, 512);
        let analyzer = SpectralAnalyzer::default();
        let err = analyzer
            .identify_frequency(&field, Some(Location::region(1, 1, 2, 2)), None)
            .unwrap_err();
        assert!(matches!(err, FatigueError::InvalidLocation(_)));
    }

    #[test]
    fn test_constant_region_is_degenerate() {
        let field = StressField::new(Array3::from_elem((64, 2, 2), 3.0), 0.01).unwrap();
        let err = SpectralAnalyzer::default()
            .identify_frequency(&field, None, None)
            .unwrap_err();
        assert!(matches!(err, FatigueError::DegenerateSignal(_)));
    }

    #[test]
    fn test_identify_picked_clamps_roi() {
        let field = resonant_field(50.0, 400.0, 1024);
        let analyzer = SpectralAnalyzer::new(WelchConfig::default(), 2).unwrap();
        let peak = analyzer
            .identify_picked(&field, &mut CornerPicker, None)
            .unwrap();
        assert!((peak.frequency - 50.0).abs() <= 1.5625);
        assert!(peak.power > 0.0);
    }

    #[test]
    fn test_moments_of_sine_series() {
        let fs = 400.0;
        let series: Vec<f64> = (0..4000)
            .map(|i| 10.0 * (2.0 * PI * 50.0 * i as f64 / fs).sin())
            .collect();
        let moments = SpectralAnalyzer::default()
            .spectral_moments(&series, 1.0 / fs)
            .unwrap();
        assert!((moments.m0 - 50.0).abs() < 1e-6);
        assert!((moments.zero_crossing_rate() - 50.0).abs() < 0.1);
    }
}
