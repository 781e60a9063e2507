//! Stress field container, spatial regions and frequency bands

use ndarray::{s, Array3, ArrayView1, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{FatigueError, Result};

// ============================================================================
// Stress Field
// ============================================================================

/// Thermoelastic stress samples `[t, row, col]` in MPa with a fixed sampling
/// interval.
///
/// Produced once by an external loader and never mutated afterwards; every
/// analysis borrows it read-only, so it can be shared across worker threads.
#[derive(Debug, Clone)]
pub struct StressField {
    data: Array3<f64>,
    dt: f64,
}

impl StressField {
    /// Wrap a `[t, row, col]` array sampled every `dt` seconds.
    pub fn new(data: Array3<f64>, dt: f64) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(FatigueError::InvalidField(format!(
                "sampling interval must be a positive number of seconds, got {dt}"
            )));
        }

        let (frames, rows, cols) = data.dim();
        if frames < 2 {
            return Err(FatigueError::InvalidField(format!(
                "need at least 2 frames for spectral estimation, got {frames}"
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(FatigueError::InvalidField(format!(
                "field has an empty spatial extent ({rows}x{cols})"
            )));
        }

        Ok(Self { data, dt })
    }

    /// Build a field from frame-major samples (`frames * rows * cols` values).
    pub fn from_frames(
        samples: Vec<f64>,
        shape: (usize, usize, usize),
        dt: f64,
    ) -> Result<Self> {
        let data = Array3::from_shape_vec(shape, samples)
            .map_err(|e| FatigueError::InvalidField(e.to_string()))?;
        Self::new(data, dt)
    }

    /// Sampling interval (s)
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Sampling rate (Hz)
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.dt
    }

    /// Nyquist frequency (Hz)
    pub fn nyquist(&self) -> f64 {
        0.5 / self.dt
    }

    /// Number of frames (time samples per pixel)
    pub fn n_samples(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn cols(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Record duration `(n - 1) * dt` in seconds.
    pub fn duration(&self) -> f64 {
        (self.n_samples() - 1) as f64 * self.dt
    }

    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Region covering the whole field of view.
    pub fn full_frame(&self) -> Location {
        Location::region(0, 0, self.rows(), self.cols())
    }

    /// Time series of a single pixel.
    pub fn pixel_series(&self, row: usize, col: usize) -> Result<ArrayView1<'_, f64>> {
        Location::pixel(row, col).validate(self.rows(), self.cols())?;
        Ok(self.data.slice(s![.., row, col]))
    }

    /// Average the region into one representative time series.
    pub fn region_mean_series(&self, location: &Location) -> Result<Vec<f64>> {
        location.validate(self.rows(), self.cols())?;

        let count = location.pixel_count() as f64;
        let region = self
            .data
            .slice(s![.., location.row_range(), location.col_range()]);

        Ok(region
            .outer_iter()
            .map(|frame| frame.sum() / count)
            .collect())
    }

    /// Field with the first frame subtracted from every frame.
    ///
    /// Removes the static thermal offset so that only the oscillating
    /// thermoelastic component remains.
    #[must_use]
    pub fn relative_to_first_frame(&self) -> Self {
        let reference = self.data.index_axis(Axis(0), 0).to_owned();
        let mut data = self.data.clone();
        for mut frame in data.outer_iter_mut() {
            frame -= &reference;
        }
        Self { data, dt: self.dt }
    }
}

// ============================================================================
// Location
// ============================================================================

/// Rectangular pixel block `(row, col, height, width)`.
///
/// A 1x1 block selects a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

impl Location {
    pub const fn region(row: usize, col: usize, height: usize, width: usize) -> Self {
        Self {
            row,
            col,
            height,
            width,
        }
    }

    pub const fn pixel(row: usize, col: usize) -> Self {
        Self::region(row, col, 1, 1)
    }

    /// Square of side `roi_size` centred on a picked pixel.
    ///
    /// The square is shifted towards the interior when the picked pixel is
    /// closer to the top/left edge than half the ROI.
    pub const fn around(row: usize, col: usize, roi_size: usize) -> Self {
        let half = roi_size / 2;
        Self::region(
            row.saturating_sub(half),
            col.saturating_sub(half),
            roi_size,
            roi_size,
        )
    }

    /// Shift the region so it lies inside a `rows x cols` frame.
    ///
    /// Fails when the region is larger than the frame itself.
    pub fn fit_within(self, rows: usize, cols: usize) -> Result<Self> {
        if self.height > rows || self.width > cols {
            return Err(FatigueError::InvalidLocation(format!(
                "{}x{} region does not fit in a {rows}x{cols} field",
                self.height, self.width
            )));
        }
        Ok(Self {
            row: self.row.min(rows - self.height),
            col: self.col.min(cols - self.width),
            ..self
        })
    }

    pub const fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    pub const fn row_range(&self) -> Range<usize> {
        self.row..self.row + self.height
    }

    pub const fn col_range(&self) -> Range<usize> {
        self.col..self.col + self.width
    }

    /// Check that the region is non-empty and inside a `rows x cols` frame.
    pub fn validate(&self, rows: usize, cols: usize) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(FatigueError::InvalidLocation(format!(
                "degenerate {}x{} region at ({}, {})",
                self.height, self.width, self.row, self.col
            )));
        }

        let row_end = self.row.checked_add(self.height);
        let col_end = self.col.checked_add(self.width);
        match (row_end, col_end) {
            (Some(r), Some(c)) if r <= rows && c <= cols => Ok(()),
            _ => Err(FatigueError::InvalidLocation(format!(
                "region rows {}..{} cols {}..{} exceeds the {rows}x{cols} field",
                self.row,
                self.row.saturating_add(self.height),
                self.col,
                self.col.saturating_add(self.width)
            ))),
        }
    }
}

/// Producer of a picked pixel, e.g. an interactive viewer.
///
/// Returns `None` when nothing was picked.
pub trait PixelPicker {
    fn pick(&mut self, field: &StressField) -> Option<(usize, usize)>;
}

/// Resolve a picked pixel into a square ROI of side `roi_size` inside the field.
pub fn pick_location<P: PixelPicker + ?Sized>(
    picker: &mut P,
    field: &StressField,
    roi_size: usize,
) -> Result<Location> {
    let (row, col) = picker
        .pick(field)
        .ok_or_else(|| FatigueError::InvalidLocation("no pixel was picked".to_string()))?;

    Location::pixel(row, col).validate(field.rows(), field.cols())?;
    if roi_size == 0 {
        return Err(FatigueError::InvalidLocation(
            "roi_size must be at least 1 pixel".to_string(),
        ));
    }

    Location::around(row, col, roi_size).fit_within(field.rows(), field.cols())
}

// ============================================================================
// Band Pass
// ============================================================================

/// Frequency window `[low, high]` (Hz) for the resonance search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPass {
    low: f64,
    high: f64,
}

impl BandPass {
    /// Ordered band with `0 <= low < high`.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(FatigueError::InvalidBand {
                low,
                high,
                reason: "bounds must be finite".to_string(),
            });
        }
        if low < 0.0 {
            return Err(FatigueError::InvalidBand {
                low,
                high,
                reason: "lower bound cannot be negative".to_string(),
            });
        }
        if low >= high {
            return Err(FatigueError::InvalidBand {
                low,
                high,
                reason: "lower bound must be below upper bound".to_string(),
            });
        }
        Ok(Self { low, high })
    }

    /// Whole spectrum from DC to Nyquist.
    pub const fn full(nyquist: f64) -> Self {
        Self {
            low: 0.0,
            high: nyquist,
        }
    }

    pub const fn low(&self) -> f64 {
        self.low
    }

    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Both edges are inside the band, so `full(nyquist)` keeps the DC and
    /// Nyquist bins.
    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.low && frequency <= self.high
    }

    /// Check the band against the Nyquist frequency of a recording.
    pub fn validate_for(&self, nyquist: f64) -> Result<()> {
        if self.high > nyquist {
            return Err(FatigueError::InvalidBand {
                low: self.low,
                high: self.high,
                reason: format!("upper bound exceeds Nyquist frequency {nyquist:.3} Hz"),
            });
        }
        Ok(())
    }
}
