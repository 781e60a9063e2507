//! Rainflow cycle counting (four-point stack method)
//!
//! The series is reduced to its turning points, closed cycles are extracted
//! as full cycles and the residue is counted as half cycles.

use serde::{Deserialize, Serialize};

use super::models::{basquin_damage, life_from_damage};
use crate::types::FatigueCurveParams;

/// One counted cycle (or half cycle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    /// Peak-to-valley range (MPa)
    pub range: f64,
    /// Mean stress (MPa)
    pub mean: f64,
    /// 1.0 for a closed cycle, 0.5 for a residue half cycle
    pub count: f64,
}

impl Cycle {
    pub fn amplitude(&self) -> f64 {
        self.range / 2.0
    }
}

/// Turning points of a series, endpoints included.
///
/// Repeated samples are collapsed and monotone runs are reduced to their
/// extreme value.
pub fn reversals(series: &[f64]) -> Vec<f64> {
    let mut points: Vec<f64> = Vec::with_capacity(series.len());

    for &x in series {
        let n = points.len();
        let Some(&prev) = points.last() else {
            points.push(x);
            continue;
        };
        if x == prev {
            continue;
        }
        if n >= 2 && (prev - points[n - 2]) * (x - prev) > 0.0 {
            // Same direction: extend the current excursion
            points[n - 1] = x;
        } else {
            points.push(x);
        }
    }

    points
}

/// Count cycles of a load history.
pub fn count_cycles(series: &[f64]) -> Vec<Cycle> {
    let mut stack: Vec<f64> = Vec::new();
    let mut cycles = Vec::new();

    for point in reversals(series) {
        stack.push(point);

        while stack.len() >= 4 {
            let n = stack.len();
            let (a, b, c, d) = (stack[n - 4], stack[n - 3], stack[n - 2], stack[n - 1]);
            let inner = (c - b).abs();

            if inner <= (b - a).abs() && inner <= (d - c).abs() {
                cycles.push(Cycle {
                    range: inner,
                    mean: (b + c) / 2.0,
                    count: 1.0,
                });
                stack.drain(n - 3..n - 1);
            } else {
                break;
            }
        }
    }

    cycles.extend(stack.windows(2).map(|w| Cycle {
        range: (w[1] - w[0]).abs(),
        mean: (w[0] + w[1]) / 2.0,
        count: 0.5,
    }));

    cycles
}

/// Palmgren-Miner damage of counted cycles under the Basquin curve.
pub fn damage(cycles: &[Cycle], params: &FatigueCurveParams) -> f64 {
    cycles
        .iter()
        .map(|c| c.count * basquin_damage(c.amplitude(), params))
        .sum()
}

/// Fatigue life (s) of a record sampled every `dt` seconds.
///
/// The record is assumed to repeat, so life = record duration / damage.
pub fn rainflow_life(series: &[f64], dt: f64, params: &FatigueCurveParams) -> f64 {
    let duration = series.len().saturating_sub(1) as f64 * dt;
    let cycles = count_cycles(series);
    let total = damage(&cycles, params);

    tracing::trace!(cycles = cycles.len(), damage = total, "Rainflow count");

    life_from_damage(duration, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn params() -> FatigueCurveParams {
        FatigueCurveParams::new(3.0, 1e12).unwrap()
    }

    #[test]
    fn test_reversals() {
        let r = reversals(&[0.0, 1.0, 2.0, 2.0, 1.0, 1.0, 3.0, 3.0]);
        assert_eq!(r, vec![0.0, 2.0, 1.0, 3.0]);
        assert!(reversals(&[5.0, 5.0, 5.0]).len() == 1);
    }

    #[test]
    fn test_four_point_extraction() {
        // 4 -> 2 closes inside 1 -> 6, then 5 -> 1 closes inside 0 -> 6
        let cycles = count_cycles(&[0.0, 5.0, 1.0, 4.0, 2.0, 6.0]);
        let full: Vec<_> = cycles.iter().filter(|c| c.count == 1.0).collect();
        assert_eq!(full.len(), 2);
        assert!((full[0].range - 2.0).abs() < 1e-12);
        assert!((full[0].mean - 3.0).abs() < 1e-12);
        assert!((full[1].range - 4.0).abs() < 1e-12);

        let residue: Vec<_> = cycles.iter().filter(|c| c.count == 0.5).collect();
        assert_eq!(residue.len(), 1);
        assert!((residue[0].range - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_sine_cycles() {
        // 10 periods of a 4-sample-per-quarter sine with amplitude 20
        let series: Vec<f64> = (0..=160)
            .map(|i| 20.0 * (2.0 * PI * i as f64 / 16.0).sin())
            .collect();
        let cycles = count_cycles(&series);
        let total: f64 = cycles.iter().map(|c| c.count).sum();
        assert!((total - 10.0).abs() <= 1.0);
        for c in cycles.iter().filter(|c| c.count == 1.0) {
            assert!((c.range - 40.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_series_is_infinite() {
        assert!(rainflow_life(&[1.0; 32], 0.01, &params()).is_infinite());
    }

    #[test]
    fn test_endurance_limit_removes_small_cycles() {
        let series = [0.0, 10.0, -10.0, 10.0, -10.0, 0.0];
        let limited = params().with_endurance_limit(11.0).unwrap();
        assert!(rainflow_life(&series, 0.01, &limited).is_infinite());
        assert!(rainflow_life(&series, 0.01, &params()).is_finite());
    }

    #[test]
    fn test_time_reversal_invariance() {
        let series = [0.0, 3.0, -1.0, 4.0, -2.0, 2.5, 0.5, 5.0, -3.0, 1.0];
        let reversed: Vec<f64> = series.iter().rev().copied().collect();
        let forward = damage(&count_cycles(&series), &params());
        let backward = damage(&count_cycles(&reversed), &params());
        assert!((forward - backward).abs() / forward < 1e-12);
    }
}
