//! Synthetic signals and fields shared by the integration tests.

#![allow(dead_code)]

use ndarray::Array3;
use num_complex::Complex;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use rustfft::FftPlanner;
use std::f64::consts::{PI, TAU};

use irflife::{FatigueCurveParams, StressField};

/// k = 3, C = 1e12 MPa³, no endurance limit.
pub fn params() -> FatigueCurveParams {
    FatigueCurveParams::new(3.0, 1e12).expect("valid curve")
}

pub fn sine(amplitude: f64, frequency: f64, fs: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| amplitude * (TAU * frequency * i as f64 / fs).sin())
        .collect()
}

pub fn gaussian_noise(seed: u64, sigma: f64, n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).expect("valid sigma");
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

/// Gaussian noise with a flat spectrum between `low` and `high` Hz and
/// standard deviation `sigma`, built from random phases and an inverse FFT.
pub fn band_limited_noise(seed: u64, n: usize, fs: f64, low: f64, high: f64, sigma: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut spectrum = vec![Complex::new(0.0, 0.0); n];
    for k in 1..n / 2 {
        let f = k as f64 * fs / n as f64;
        if (low..=high).contains(&f) {
            let phase: f64 = rng.gen_range(0.0..TAU);
            spectrum[k] = Complex::from_polar(1.0, phase);
            spectrum[n - k] = spectrum[k].conj();
        }
    }
    FftPlanner::new().plan_fft_inverse(n).process(&mut spectrum);

    let x: Vec<f64> = spectrum.iter().map(|c| c.re).collect();
    let mean = x.iter().sum::<f64>() / n as f64;
    let std = (x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    x.iter().map(|v| (v - mean) * sigma / std).collect()
}

/// Field whose pixel `(r, c)` carries `pixel(r, c)`, a series of `n` samples.
pub fn field_from_fn<F>(rows: usize, cols: usize, n: usize, dt: f64, mut pixel: F) -> StressField
where
    F: FnMut(usize, usize) -> Vec<f64>,
{
    let mut data = Array3::zeros((n, rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let series = pixel(r, c);
            assert_eq!(series.len(), n);
            for (t, v) in series.into_iter().enumerate() {
                data[[t, r, c]] = v;
            }
        }
    }
    StressField::new(data, dt).expect("valid field")
}

/// 50 Hz vibration at 400 Hz sampling with a pixel-dependent amplitude and
/// a little seeded noise.
pub fn vibrating_field(rows: usize, cols: usize, n: usize) -> StressField {
    let fs = 400.0;
    field_from_fn(rows, cols, n, 1.0 / fs, |r, c| {
        let amplitude = 10.0 + 5.0 * (r * cols + c) as f64;
        let noise = gaussian_noise((r * cols + c) as u64, 0.8, n);
        sine(amplitude, 50.0, fs, n)
            .into_iter()
            .zip(noise)
            .map(|(s, e)| s + e + 0.3 * (PI * c as f64).cos())
            .collect()
    })
}

pub fn rel_diff(a: f64, b: f64) -> f64 {
    (a - b).abs() / b.abs()
}
