//! Full-field assembly of per-pixel results
//!
//! Pixels are evaluated on a rayon worker pool. Each worker owns whole
//! output rows, so cells are written without locking. Every cell carries a
//! status, which keeps a cancelled map consistent: cells never reached stay
//! `Pending` with a NaN value.

mod task;

pub use task::*;

use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FatigueError, Result};
use crate::types::{FAILED_LIFE, INFINITE_LIFE};

/// Evaluation state of one map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// Not evaluated (pass cancelled before reaching it)
    #[default]
    Pending,
    /// Regular value
    Evaluated,
    /// Constant pixel; value is [`INFINITE_LIFE`]
    Degenerate,
    /// Evaluation failed; value is [`FAILED_LIFE`]
    Failed,
}

/// 2-D grid of per-pixel values with the field's spatial extent.
#[derive(Debug, Clone, Serialize)]
pub struct FieldMap {
    values: Array2<f64>,
    status: Array2<CellStatus>,
}

/// Per-pixel fatigue lives (s).
pub type LifeMap = FieldMap;

/// Per-pixel equivalent sinusoid amplitudes (MPa).
pub type AmplitudeMap = FieldMap;

/// Aggregate view of a map, over cells with a finite value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub evaluated: usize,
    pub degenerate: usize,
    pub failed: usize,
    pub pending: usize,
}

impl FieldMap {
    /// Map with every cell pending.
    pub fn pending(rows: usize, cols: usize) -> Self {
        Self {
            values: Array2::from_elem((rows, cols), f64::NAN),
            status: Array2::from_elem((rows, cols), CellStatus::Pending),
        }
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub const fn status(&self) -> &Array2<CellStatus> {
        &self.status
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    pub fn status_at(&self, row: usize, col: usize) -> Option<CellStatus> {
        self.status.get((row, col)).copied()
    }

    pub fn count(&self, status: CellStatus) -> usize {
        self.status.iter().filter(|&&s| s == status).count()
    }

    /// Every cell has been visited.
    pub fn is_complete(&self) -> bool {
        self.count(CellStatus::Pending) == 0
    }

    pub fn summary(&self) -> MapSummary {
        let finite: Vec<f64> = self
            .values
            .iter()
            .zip(self.status.iter())
            .filter(|(v, &s)| s == CellStatus::Evaluated && v.is_finite())
            .map(|(&v, _)| v)
            .collect();

        let mean = if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        };

        MapSummary {
            min: finite.iter().copied().reduce(f64::min),
            max: finite.iter().copied().reduce(f64::max),
            mean,
            evaluated: self.count(CellStatus::Evaluated),
            degenerate: self.count(CellStatus::Degenerate),
            failed: self.count(CellStatus::Failed),
            pending: self.count(CellStatus::Pending),
        }
    }
}

// ============================================================================
// Map Builder
// ============================================================================

/// Runs a per-pixel evaluation over a `rows x cols` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBuilder {
    rows: usize,
    cols: usize,
    threads: Option<usize>,
}

impl MapBuilder {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            threads: None,
        }
    }

    /// Use a dedicated pool of `threads` workers instead of the global pool.
    #[must_use]
    pub const fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Evaluate `eval(row, col)` for every cell.
    ///
    /// Recoverable errors become sentinels (`DegenerateSignal` ->
    /// [`INFINITE_LIFE`], others -> [`FAILED_LIFE`]); any other error aborts
    /// the pass. A cancelled pass returns the partially filled map.
    pub fn build<F>(&self, task: &FieldTask, eval: F) -> Result<FieldMap>
    where
        F: Fn(usize, usize) -> Result<f64> + Sync,
    {
        let total = self.rows * self.cols;
        let mut map = FieldMap::pending(self.rows, self.cols);
        task.begin(total);

        info!(
            rows = self.rows,
            cols = self.cols,
            threads = ?self.threads,
            "Starting full-field pass"
        );

        let cols = self.cols;
        let FieldMap { values, status } = &mut map;
        let mut fill = || -> Result<()> {
            values
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(status.axis_iter_mut(Axis(0)).into_par_iter())
                .enumerate()
                .try_for_each(|(row, (mut value_row, mut status_row))| {
                    for col in 0..cols {
                        if task.is_cancelled() {
                            return Ok(());
                        }
                        let (value, cell) = match eval(row, col) {
                            Ok(value) => (value, CellStatus::Evaluated),
                            Err(FatigueError::DegenerateSignal(_)) => {
                                (INFINITE_LIFE, CellStatus::Degenerate)
                            }
                            Err(e) if e.is_recoverable() => {
                                debug!(row, col, error = %e, "Pixel evaluation failed");
                                (FAILED_LIFE, CellStatus::Failed)
                            }
                            Err(e) => return Err(e),
                        };
                        value_row[col] = value;
                        status_row[col] = cell;
                        task.advance();
                    }
                    Ok(())
                })
        };

        match self.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| FatigueError::ThreadPool(e.to_string()))?;
                pool.install(fill)?;
            }
            None => fill()?,
        }

        if task.is_cancelled() {
            warn!(
                completed = task.progress().completed(),
                total, "Full-field pass cancelled"
            );
        } else {
            let summary = map.summary();
            info!(
                evaluated = summary.evaluated,
                degenerate = summary.degenerate,
                failed = summary.failed,
                "Full-field pass finished"
            );
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_preserves_coordinates() {
        let map = MapBuilder::new(3, 4)
            .build(&FieldTask::new(), |r, c| Ok((r * 10 + c) as f64))
            .unwrap();
        assert_eq!(map.rows(), 3);
        assert_eq!(map.cols(), 4);
        assert_eq!(map.get(2, 3), Some(23.0));
        assert_eq!(map.get(0, 1), Some(1.0));
        assert!(map.is_complete());
    }

    #[test]
    fn test_sentinels() {
        let map = MapBuilder::new(1, 3)
            .build(&FieldTask::new(), |_, c| match c {
                0 => Ok(5.0),
                1 => Err(FatigueError::DegenerateSignal("flat".into())),
                _ => Err(FatigueError::NonFiniteSignal),
            })
            .unwrap();

        assert_eq!(map.status_at(0, 0), Some(CellStatus::Evaluated));
        assert_eq!(map.status_at(0, 1), Some(CellStatus::Degenerate));
        assert!(map.get(0, 1).unwrap().is_infinite());
        assert_eq!(map.status_at(0, 2), Some(CellStatus::Failed));
        assert!(map.get(0, 2).unwrap().is_nan());

        let summary = map.summary();
        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.mean, Some(5.0));
    }

    #[test]
    fn test_hard_error_aborts() {
        let result = MapBuilder::new(2, 2).build(&FieldTask::new(), |_, _| {
            Err(FatigueError::MissingFrequency)
        });
        assert_eq!(result.unwrap_err(), FatigueError::MissingFrequency);
    }

    #[test]
    fn test_cancelled_before_start() {
        let task = FieldTask::new();
        task.cancel();
        let map = MapBuilder::new(2, 3).build(&task, |_, _| Ok(1.0)).unwrap();
        assert_eq!(map.count(CellStatus::Pending), 6);
        assert!(!map.is_complete());
        assert_eq!(task.progress().completed(), 0);
    }

    #[test]
    fn test_dedicated_pool() {
        let map = MapBuilder::new(4, 4)
            .with_threads(Some(2))
            .build(&FieldTask::new(), |_, _| Ok(2.0))
            .unwrap();
        assert_eq!(map.summary().evaluated, 16);
    }
}
