//! Fatigue Model Properties
//!
//! End-to-end checks of the damage models on synthetic signals with known
//! behaviour: pure tones, time reversal, broadband and narrow-band noise,
//! constant input and the endurance limit.

mod common;

use common::{band_limited_noise, gaussian_noise, params, rel_diff, sine};
use irflife::fatigue::rainflow::rainflow_life;
use irflife::fatigue::spectral_models::narrow_band_life;
use irflife::{
    BandPass, EstimateOptions, FatigueError, FatigueEstimator, FatigueModel, Location,
    SpectralAnalyzer, StressField, INFINITE_LIFE,
};

fn estimate(series: &[f64], fs: f64, model: FatigueModel, options: &EstimateOptions) -> f64 {
    FatigueEstimator::default()
        .estimate_series(series, 1.0 / fs, &params(), model, options)
        .expect("estimate")
}

// ============================================================================
// Pure sinusoid
// ============================================================================

const TONE_FS: f64 = 400.0;
const TONE_F: f64 = 50.0;
const TONE_A: f64 = 20.0;
const TONE_N: usize = 4000;

/// `C / (A^k · f)` for the test tone: 1e12 / (8000 · 50)
const TONE_LIFE: f64 = 2.5e6;

#[test]
fn rainflow_matches_sinusoid_life() {
    let series = sine(TONE_A, TONE_F, TONE_FS, TONE_N);
    let life = estimate(&series, TONE_FS, FatigueModel::Rainflow, &EstimateOptions::new());
    assert!(rel_diff(life, TONE_LIFE) < 0.01, "rainflow life {life}");
}

#[test]
fn modal_matches_sinusoid_life() {
    let series = sine(TONE_A, TONE_F, TONE_FS, TONE_N);

    let options = EstimateOptions::new().with_frequency(TONE_F);
    let life = estimate(&series, TONE_FS, FatigueModel::Modal, &options);
    assert!(rel_diff(life, TONE_LIFE) < 0.01, "modal life {life}");

    let windowed = options.with_modal_span(0.5);
    let life = estimate(&series, TONE_FS, FatigueModel::Modal, &windowed);
    assert!(rel_diff(life, TONE_LIFE) < 0.01, "windowed modal life {life}");
}

#[test]
fn gaussian_models_match_narrow_band_on_a_tone() {
    let series = sine(TONE_A, TONE_F, TONE_FS, TONE_N);
    let moments = SpectralAnalyzer::default()
        .spectral_moments(&series, 1.0 / TONE_FS)
        .expect("moments");
    let reference = narrow_band_life(&moments, &params());

    for model in [FatigueModel::Dirlik, FatigueModel::TovoBenasciutti] {
        let life = estimate(&series, TONE_FS, model, &EstimateOptions::new());
        assert!(
            rel_diff(life, reference) < 0.05,
            "{model}: {life} vs narrow-band {reference}"
        );
    }
}

// ============================================================================
// Rainflow symmetry
// ============================================================================

#[test]
fn rainflow_life_is_invariant_under_time_reversal() {
    let fs = 500.0;
    let series: Vec<f64> = band_limited_noise(11, 8192, fs, 5.0, 120.0, 15.0)
        .into_iter()
        .zip(gaussian_noise(12, 2.0, 8192))
        .map(|(a, b)| a + b)
        .collect();
    let reversed: Vec<f64> = series.iter().rev().copied().collect();

    let forward = rainflow_life(&series, 1.0 / fs, &params());
    let backward = rainflow_life(&reversed, 1.0 / fs, &params());
    assert!(forward.is_finite());
    assert!(rel_diff(backward, forward) < 1e-9, "{forward} vs {backward}");
}

// ============================================================================
// Random loading
// ============================================================================

const NOISE_FS: f64 = 1024.0;
const NOISE_N: usize = 65_536;

fn model_lives(series: &[f64]) -> (f64, f64, f64, f64) {
    let moments = SpectralAnalyzer::default()
        .spectral_moments(series, 1.0 / NOISE_FS)
        .expect("moments");
    let options = EstimateOptions::new();
    (
        narrow_band_life(&moments, &params()),
        estimate(series, NOISE_FS, FatigueModel::Dirlik, &options),
        estimate(series, NOISE_FS, FatigueModel::TovoBenasciutti, &options),
        estimate(series, NOISE_FS, FatigueModel::Rainflow, &options),
    )
}

#[test]
fn spectral_models_lie_between_narrow_band_and_rainflow() {
    // Flat bands reaching towards Nyquist, as recorded at camera frame rates
    for (seed, low, high) in [(1, 10.0, 300.0), (2, 10.0, 400.0), (3, 100.0, 400.0)] {
        let series = band_limited_noise(seed, NOISE_N, NOISE_FS, low, high, 10.0);
        let (narrow, dirlik, tovo, rainflow) = model_lives(&series);

        assert!(
            narrow < dirlik && dirlik < rainflow,
            "{low}-{high} Hz: narrow {narrow} dirlik {dirlik} rainflow {rainflow}"
        );
        assert!(
            narrow < tovo && tovo < rainflow,
            "{low}-{high} Hz: narrow {narrow} tovo {tovo} rainflow {rainflow}"
        );
    }
}

#[test]
fn well_sampled_broadband_models_track_rainflow() {
    let series = band_limited_noise(1, NOISE_N, NOISE_FS, 10.0, 100.0, 10.0);
    let (narrow, dirlik, tovo, rainflow) = model_lives(&series);

    // Narrow-band stays the conservative bound on a broad spectrum
    assert!(narrow < dirlik, "narrow {narrow} dirlik {dirlik}");
    assert!(narrow < tovo, "narrow {narrow} tovo {tovo}");
    assert!(rel_diff(narrow, dirlik) > 0.05);

    assert!(rel_diff(dirlik, rainflow) < 0.1, "dirlik {dirlik} rainflow {rainflow}");
    assert!(rel_diff(tovo, rainflow) < 0.1, "tovo {tovo} rainflow {rainflow}");
}

#[test]
fn narrow_band_noise_models_agree() {
    let series = band_limited_noise(2, NOISE_N, NOISE_FS, 48.0, 52.0, 10.0);
    let (narrow, dirlik, tovo, rainflow) = model_lives(&series);

    for (name, life) in [("dirlik", dirlik), ("tovo", tovo), ("narrow", narrow)] {
        assert!(
            rel_diff(life, rainflow) < 0.1,
            "{name} {life} vs rainflow {rainflow}"
        );
    }
}

// ============================================================================
// Endurance limit
// ============================================================================

#[test]
fn endurance_limit_extends_life() {
    let series = band_limited_noise(3, 16_384, NOISE_FS, 10.0, 100.0, 10.0);
    let limited = params().with_endurance_limit(10.0).expect("limit");
    let estimator = FatigueEstimator::default();
    let options = EstimateOptions::new().with_frequency(50.0);

    for model in FatigueModel::ALL {
        let free = estimator
            .estimate_series(&series, 1.0 / NOISE_FS, &params(), model, &options)
            .expect("estimate");
        let cut = estimator
            .estimate_series(&series, 1.0 / NOISE_FS, &limited, model, &options)
            .expect("estimate");
        assert!(cut >= free, "{model}: {cut} < {free}");
    }
}

#[test]
fn tone_below_endurance_limit_never_fails() {
    let series = sine(TONE_A, TONE_F, TONE_FS, TONE_N);
    let limited = params().with_endurance_limit(25.0).expect("limit");
    let options = EstimateOptions::new().with_frequency(TONE_F);

    for model in [FatigueModel::Rainflow, FatigueModel::Modal] {
        let life = FatigueEstimator::default()
            .estimate_series(&series, 1.0 / TONE_FS, &limited, model, &options)
            .expect("estimate");
        assert_eq!(life, INFINITE_LIFE, "{model}");
    }
}

// ============================================================================
// Resonance identification
// ============================================================================

#[test]
fn tone_in_noise_is_identified_within_one_bin() {
    let fs = 400.0;
    let n = 4096;
    let field = common::field_from_fn(2, 2, n, 1.0 / fs, |r, c| {
        sine(5.0, 50.0, fs, n)
            .into_iter()
            .zip(gaussian_noise((r * 2 + c) as u64 + 100, 0.5, n))
            .map(|(s, e)| s + e)
            .collect()
    });
    let band = BandPass::new(40.0, 60.0).expect("band");

    let analyzer = SpectralAnalyzer::default();
    let peak = analyzer
        .identify_peak(&field, Some(Location::region(0, 0, 2, 2)), Some(band))
        .expect("peak");
    let resolution = fs / 256.0;
    assert!((peak.frequency - 50.0).abs() <= resolution, "{}", peak.frequency);
    assert!(peak.power > 0.0);
}

#[test]
fn band_errors() {
    assert!(matches!(
        BandPass::new(300.0, 100.0),
        Err(FatigueError::InvalidBand { .. })
    ));

    // Nyquist is 200 Hz
    let field = common::field_from_fn(1, 1, 1024, 1.0 / 400.0, |_, _| sine(1.0, 50.0, 400.0, 1024));
    let wide = BandPass::new(0.0, 10_000.0).expect("ordered band");
    let err = SpectralAnalyzer::default()
        .identify_frequency(&field, None, Some(wide))
        .unwrap_err();
    assert!(matches!(err, FatigueError::InvalidBand { .. }));
}

// ============================================================================
// Degenerate input
// ============================================================================

#[test]
fn constant_input_gives_infinite_life_for_every_model() {
    let field = StressField::new(ndarray::Array3::from_elem((512, 2, 2), 7.5), 1.0 / 400.0)
        .expect("field");
    let estimator = FatigueEstimator::default();
    let options = EstimateOptions::new()
        .with_frequency(50.0)
        .at(Location::region(0, 0, 2, 2));

    for model in FatigueModel::ALL {
        let life = estimator
            .estimate_life(&field, &params(), model, &options)
            .expect("estimate")
            .as_scalar()
            .expect("scalar");
        assert_eq!(life, INFINITE_LIFE, "{model}");
    }
}

#[test]
fn modal_without_frequency_is_rejected() {
    let field = common::vibrating_field(2, 2, 512);
    let err = FatigueEstimator::default()
        .estimate_life(
            &field,
            &params(),
            FatigueModel::Modal,
            &EstimateOptions::new().at(Location::pixel(0, 0)),
        )
        .unwrap_err();
    assert_eq!(err, FatigueError::MissingFrequency);
}

#[test]
fn modal_with_non_positive_frequency_is_rejected() {
    let series = sine(TONE_A, TONE_F, TONE_FS, TONE_N);
    let err = FatigueEstimator::default()
        .estimate_series(
            &series,
            1.0 / TONE_FS,
            &params(),
            FatigueModel::Modal,
            &EstimateOptions::new().with_frequency(-50.0),
        )
        .unwrap_err();
    assert_eq!(err, FatigueError::InvalidFrequency(-50.0));
}

#[test]
fn unknown_model_name_is_rejected() {
    let field = common::vibrating_field(2, 2, 512);
    let err = FatigueEstimator::default()
        .estimate_life_named(&field, &params(), "Gaussian", &EstimateOptions::new())
        .unwrap_err();
    assert!(matches!(err, FatigueError::UnknownModel(_)));
}
