//! Fatigue life estimation
//!
//! `FatigueEstimator::estimate_life` dispatches on a closed set of models:
//!
//! - `Rainflow`: time-domain cycle counting with Palmgren-Miner summation
//! - `Dirlik`: empirical amplitude distribution from spectral moments
//! - `TovoBenasciutti`: bandwidth-corrected narrow-band damage
//! - `Modal`: equivalent sinusoid at the resonant frequency
//!
//! With a location the result is one life; without one, every pixel of the
//! field is evaluated on the worker pool and the lives are returned as a map.

pub mod modal;
pub mod models;
pub mod rainflow;
pub mod spectral_models;

use tracing::{debug, info};

use crate::error::{FatigueError, Result};
use crate::processing::{
    peak_to_peak, FftProcessor, SpectralAnalyzer, SpectralMoments, WelchEstimator,
};
use crate::spatial::{AmplitudeMap, FieldTask, LifeMap, MapBuilder};
use crate::types::{
    EstimateOptions, FatigueCurveParams, FatigueModel, FatigueResult, Location, RegionMode,
    StressField, INFINITE_LIFE,
};

/// Fatigue life estimator over a stress field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FatigueEstimator {
    analyzer: SpectralAnalyzer,
    threads: Option<usize>,
}

impl FatigueEstimator {
    pub const fn new(analyzer: SpectralAnalyzer) -> Self {
        Self {
            analyzer,
            threads: None,
        }
    }

    /// Size of the worker pool for full-field passes (global pool when unset).
    #[must_use]
    pub const fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub const fn analyzer(&self) -> &SpectralAnalyzer {
        &self.analyzer
    }

    /// Estimate fatigue life (s) for a location, or for every pixel when
    /// `options.location` is unset.
    pub fn estimate_life(
        &self,
        field: &StressField,
        params: &FatigueCurveParams,
        model: FatigueModel,
        options: &EstimateOptions,
    ) -> Result<FatigueResult> {
        self.estimate_life_with_task(field, params, model, options, &FieldTask::new())
    }

    /// [`Self::estimate_life`] with a model given by name.
    pub fn estimate_life_named(
        &self,
        field: &StressField,
        params: &FatigueCurveParams,
        model: &str,
        options: &EstimateOptions,
    ) -> Result<FatigueResult> {
        let model: FatigueModel = model.parse()?;
        self.estimate_life(field, params, model, options)
    }

    /// [`Self::estimate_life`] with progress reporting and cancellation for
    /// the full-field case.
    pub fn estimate_life_with_task(
        &self,
        field: &StressField,
        params: &FatigueCurveParams,
        model: FatigueModel,
        options: &EstimateOptions,
        task: &FieldTask,
    ) -> Result<FatigueResult> {
        match options.location {
            Some(location) => self
                .estimate_location(field, params, model, options, &location)
                .map(FatigueResult::Scalar),
            None => self
                .life_map(field, params, model, options, task)
                .map(FatigueResult::Map),
        }
    }

    /// Life (s) of one region, reduced according to `options.region_mode`.
    pub fn estimate_location(
        &self,
        field: &StressField,
        params: &FatigueCurveParams,
        model: FatigueModel,
        options: &EstimateOptions,
        location: &Location,
    ) -> Result<f64> {
        let kernel = SeriesKernel::new(&self.analyzer, params, model, options, field)?;
        location.validate(field.rows(), field.cols())?;

        let life = match options.region_mode {
            RegionMode::MeanSeries => {
                let series = field.region_mean_series(location)?;
                kernel.evaluate_or_infinite(&series)?
            }
            RegionMode::MeanLife => mean_region_life(&kernel, field, location)?,
        };

        info!(
            model = %model,
            row = location.row,
            col = location.col,
            height = location.height,
            width = location.width,
            life_s = life,
            "Estimated fatigue life"
        );
        Ok(life)
    }

    /// Life (s) of a single stress series sampled every `dt` seconds.
    pub fn estimate_series(
        &self,
        series: &[f64],
        dt: f64,
        params: &FatigueCurveParams,
        model: FatigueModel,
        options: &EstimateOptions,
    ) -> Result<f64> {
        let kernel = SeriesKernel::with_length(
            &self.analyzer,
            params,
            model,
            options,
            series.len(),
            dt,
        )?;
        kernel.evaluate_or_infinite(series)
    }

    /// Per-pixel lives over the whole field.
    pub fn life_map(
        &self,
        field: &StressField,
        params: &FatigueCurveParams,
        model: FatigueModel,
        options: &EstimateOptions,
        task: &FieldTask,
    ) -> Result<LifeMap> {
        let kernel = SeriesKernel::new(&self.analyzer, params, model, options, field)?;
        debug!(model = %model, pixels = field.rows() * field.cols(), "Building life map");

        MapBuilder::new(field.rows(), field.cols())
            .with_threads(self.threads)
            .build(task, |row, col| {
                let series = field.pixel_series(row, col)?.to_vec();
                kernel.evaluate(&series)
            })
    }

    /// Per-pixel equivalent sinusoid amplitude `sqrt(2·m0)` (MPa), the input
    /// of the modal model. Constant pixels hold zero.
    pub fn amplitude_map(&self, field: &StressField, task: &FieldTask) -> Result<AmplitudeMap> {
        let welch = self.analyzer.estimator(field.n_samples(), field.dt())?;

        MapBuilder::new(field.rows(), field.cols())
            .with_threads(self.threads)
            .build(task, |row, col| {
                let series = field.pixel_series(row, col)?.to_vec();
                if peak_to_peak(&series)? == 0.0 {
                    return Ok(0.0);
                }
                Ok(welch.estimate(&series)?.moments().equivalent_amplitude())
            })
    }
}

/// Mean of the per-pixel lives of a region.
///
/// Failed pixels are skipped; a single infinite life makes the mean infinite.
fn mean_region_life(
    kernel: &SeriesKernel,
    field: &StressField,
    location: &Location,
) -> Result<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;

    for row in location.row_range() {
        for col in location.col_range() {
            let series = field.pixel_series(row, col)?.to_vec();
            match kernel.evaluate_or_infinite(&series) {
                Ok(life) => {
                    sum += life;
                    count += 1;
                }
                Err(e) if e.is_recoverable() => {
                    debug!(row, col, error = %e, "Skipping pixel in region mean");
                }
                Err(e) => return Err(e),
            }
        }
    }

    if count == 0 {
        return Err(FatigueError::NonFiniteSignal);
    }
    Ok(sum / count as f64)
}

// ============================================================================
// Series Kernel
// ============================================================================

/// One model with everything it needs planned up front, evaluated on many
/// series of the same length.
pub(crate) struct SeriesKernel {
    model: FatigueModel,
    params: FatigueCurveParams,
    dt: f64,
    frequency: Option<f64>,
    modal_span: Option<f64>,
    welch: Option<WelchEstimator>,
    fft: Option<FftProcessor>,
}

impl SeriesKernel {
    fn new(
        analyzer: &SpectralAnalyzer,
        params: &FatigueCurveParams,
        model: FatigueModel,
        options: &EstimateOptions,
        field: &StressField,
    ) -> Result<Self> {
        Self::with_length(
            analyzer,
            params,
            model,
            options,
            field.n_samples(),
            field.dt(),
        )
    }

    pub(crate) fn with_length(
        analyzer: &SpectralAnalyzer,
        params: &FatigueCurveParams,
        model: FatigueModel,
        options: &EstimateOptions,
        n_samples: usize,
        dt: f64,
    ) -> Result<Self> {
        params.validate()?;

        let frequency = match (model.requires_frequency(), options.frequency) {
            (true, None) => return Err(FatigueError::MissingFrequency),
            (true, Some(f)) => {
                modal::check_frequency(f)?;
                Some(f)
            }
            (false, _) => None,
        };

        let modal_span = if model == FatigueModel::Modal {
            if let Some(span) = options.modal_span {
                modal::check_span(span)?;
            }
            options.modal_span
        } else {
            None
        };

        let (welch, fft) = match (model, modal_span) {
            (FatigueModel::Rainflow, _) => (None, None),
            (FatigueModel::Modal, Some(_)) => {
                (None, Some(FftProcessor::new(n_samples, 1.0 / dt)?))
            }
            _ => (Some(analyzer.estimator(n_samples, dt)?), None),
        };

        Ok(Self {
            model,
            params: *params,
            dt,
            frequency,
            modal_span,
            welch,
            fft,
        })
    }

    /// Life of a series; constant series are `DegenerateSignal` errors.
    pub(crate) fn evaluate(&self, series: &[f64]) -> Result<f64> {
        if peak_to_peak(series)? == 0.0 {
            return Err(FatigueError::DegenerateSignal(
                "constant stress series".to_string(),
            ));
        }

        let life = match self.model {
            FatigueModel::Rainflow => rainflow::rainflow_life(series, self.dt, &self.params),
            FatigueModel::Dirlik => {
                spectral_models::dirlik_life(&self.moments(series)?, &self.params)
            }
            FatigueModel::TovoBenasciutti => {
                spectral_models::tovo_benasciutti_life(&self.moments(series)?, &self.params)
            }
            FatigueModel::Modal => self.modal_life(series)?,
        };
        Ok(life)
    }

    /// Like [`Self::evaluate`], with constant series mapped to
    /// [`INFINITE_LIFE`].
    pub(crate) fn evaluate_or_infinite(&self, series: &[f64]) -> Result<f64> {
        match self.evaluate(series) {
            Err(FatigueError::DegenerateSignal(_)) => Ok(INFINITE_LIFE),
            other => other,
        }
    }

    fn moments(&self, series: &[f64]) -> Result<SpectralMoments> {
        let welch = self
            .welch
            .as_ref()
            .ok_or_else(|| FatigueError::Spectral("no PSD estimator planned".to_string()))?;
        Ok(welch.estimate(series)?.moments())
    }

    fn modal_life(&self, series: &[f64]) -> Result<f64> {
        let frequency = self.frequency.ok_or(FatigueError::MissingFrequency)?;
        match (self.modal_span, &self.fft) {
            (Some(span), Some(fft)) => {
                let spectrum = fft.amplitude_spectrum(series)?;
                modal::modal_span_life(&spectrum, frequency, span, &self.params)
            }
            _ => Ok(modal::modal_life(&self.moments(series)?, frequency, &self.params)),
        }
    }
}
