//! Synthetic Thermoelastic Field Simulation
//!
//! Builds a stress field that vibrates in a single bending mode, adds sensor
//! noise and a slow thermal drift, then runs the whole identification chain:
//! resonance search, fatigue life at a region for every model, and a
//! full-field life map.
//!
//! # Usage
//! ```bash
//! ./simulation --frequency 48 --amplitude 30 --seed 7
//! ./simulation --config irflife.toml --json > report.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::Array3;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use irflife::processing::peak_to_peak;
use irflife::spatial::MapSummary;
use irflife::types::PixelPicker;
use irflife::{
    AnalysisConfig, CellStatus, EstimateOptions, FatigueModel, FieldTask, Location, StressField,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "irflife-simulation")]
#[command(about = "Synthetic thermoelastic field for fatigue life identification")]
#[command(version)]
struct Args {
    /// Analysis config (TOML); falls back to $IRFLIFE_CONFIG, ./irflife.toml, defaults
    #[arg(short, long, env = "IRFLIFE_CONFIG")]
    config: Option<PathBuf>,

    /// Field height in pixels
    #[arg(long, default_value = "24")]
    rows: usize,

    /// Field width in pixels
    #[arg(long, default_value = "32")]
    cols: usize,

    /// Camera frame rate (Hz)
    #[arg(long, default_value = "400")]
    frame_rate: f64,

    /// Recording length (s)
    #[arg(long, default_value = "10")]
    duration: f64,

    /// Resonant frequency of the simulated mode (Hz)
    #[arg(short, long, default_value = "48")]
    frequency: f64,

    /// Stress amplitude at the antinode (MPa)
    #[arg(short, long, default_value = "30")]
    amplitude: f64,

    /// Standard deviation of the sensor noise (MPa)
    #[arg(long, default_value = "1.5")]
    noise: f64,

    /// Thermal drift over the whole recording (MPa equivalent)
    #[arg(long, default_value = "5")]
    drift: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Emit the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Structured JSON log lines on stderr
    #[arg(long)]
    json_logs: bool,
}

// ============================================================================
// Field Synthesis
// ============================================================================

/// First bending mode shape, 1 at the centre and falling to the edges.
fn mode_shape(row: usize, col: usize, rows: usize, cols: usize) -> f64 {
    let y = (row as f64 + 0.5) / rows as f64;
    let x = (col as f64 + 0.5) / cols as f64;
    (PI * y).sin() * (PI * x).sin()
}

fn synthesize(args: &Args) -> Result<StressField> {
    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let noise = Normal::new(0.0, args.noise.max(0.0)).context("invalid noise level")?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let frames = (args.duration * args.frame_rate).round() as usize;
    let dt = 1.0 / args.frame_rate;
    let omega = 2.0 * PI * args.frequency;
    let (rows, cols) = (args.rows, args.cols);

    // Static temperature offset, removed again by the first-frame reference
    let baseline = 20.0;

    let data = Array3::from_shape_fn((frames, rows, cols), |(t, r, c)| {
        let time = t as f64 * dt;
        let shape = mode_shape(r, c, rows, cols);
        baseline
            + args.drift * time / args.duration
            + args.amplitude * shape * (omega * time).sin()
            + noise.sample(&mut rng)
    });

    Ok(StressField::new(data, dt)?)
}

/// Picks the pixel with the largest peak-to-peak stress.
struct AntinodePicker;

impl PixelPicker for AntinodePicker {
    fn pick(&mut self, field: &StressField) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), f64)> = None;
        for row in 0..field.rows() {
            for col in 0..field.cols() {
                let Ok(series) = field.pixel_series(row, col) else {
                    continue;
                };
                let Ok(range) = peak_to_peak(&series.to_vec()) else {
                    continue;
                };
                if best.map_or(true, |(_, r)| range > r) {
                    best = Some(((row, col), range));
                }
            }
        }
        best.map(|(pixel, _)| pixel)
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Serialize)]
struct ModelLife {
    model: FatigueModel,
    location_life_s: f64,
    map: MapSummary,
}

#[derive(Debug, Serialize)]
struct Report {
    rows: usize,
    cols: usize,
    frames: usize,
    sampling_rate_hz: f64,
    simulated_frequency_hz: f64,
    identified_frequency_hz: f64,
    peak_power: f64,
    location: Location,
    models: Vec<ModelLife>,
}

fn print_text(report: &Report) {
    println!("{}", "=".repeat(70));
    println!("IR-FLife synthetic field");
    println!("{}", "=".repeat(70));
    println!(
        "Field:       {}x{} pixels, {} frames at {:.0} Hz",
        report.rows, report.cols, report.frames, report.sampling_rate_hz
    );
    println!(
        "Resonance:   {:.3} Hz identified ({:.3} Hz simulated), PSD peak {:.3e} MPa²/Hz",
        report.identified_frequency_hz, report.simulated_frequency_hz, report.peak_power
    );
    println!(
        "Location:    rows {}..{} cols {}..{}",
        report.location.row,
        report.location.row + report.location.height,
        report.location.col,
        report.location.col + report.location.width
    );
    println!();
    println!(
        "{:<16} {:>14} {:>14} {:>14} {:>9}",
        "model", "location [s]", "map min [s]", "map mean [s]", "failed"
    );
    for m in &report.models {
        println!(
            "{:<16} {:>14.4e} {:>14} {:>14} {:>9}",
            m.model.name(),
            m.location_life_s,
            format_opt(m.map.min),
            format_opt(m.map.mean),
            m.map.failed
        );
    }
}

fn format_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4e}"))
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AnalysisConfig::load(),
    };

    let params = config.curve_params()?;
    let band = config.band_pass()?;
    let estimator = config.estimator()?;
    let analyzer = estimator.analyzer();

    info!(
        rows = args.rows,
        cols = args.cols,
        frequency = args.frequency,
        amplitude = args.amplitude,
        seed = ?args.seed,
        "Synthesizing stress field"
    );
    let field = synthesize(&args)?.relative_to_first_frame();

    // Configured location wins; otherwise the ROI around the antinode
    let location = match config.estimation.location {
        Some(location) => location,
        None => irflife::types::pick_location(&mut AntinodePicker, &field, analyzer.roi_size())?,
    };

    let peak = analyzer.identify_peak(&field, Some(location), band)?;
    if (peak.frequency - args.frequency).abs() > field.sampling_rate() / 2.0 / 100.0 {
        warn!(
            identified = peak.frequency,
            simulated = args.frequency,
            "Identified resonance is off the simulated mode"
        );
    }

    let frequency = config.estimation.frequency.unwrap_or(peak.frequency);
    let mut options = config.estimate_options().with_frequency(frequency);
    if let Some(span) = config.estimation.modal_span {
        options = options.with_modal_span(span);
    }

    let started = Instant::now();
    let mut models = Vec::with_capacity(FatigueModel::ALL.len());
    for model in FatigueModel::ALL {
        let location_life =
            estimator.estimate_location(&field, &params, model, &options, &location)?;

        let task = FieldTask::new();
        let map_options = EstimateOptions { location: None, ..options };
        let map = estimator
            .estimate_life_with_task(&field, &params, model, &map_options, &task)?
            .into_map()
            .context("full-field estimate returned a scalar")?;

        if map.count(CellStatus::Failed) > 0 {
            warn!(model = %model, failed = map.count(CellStatus::Failed), "Some pixels failed");
        }

        models.push(ModelLife {
            model,
            location_life_s: location_life,
            map: map.summary(),
        });
    }
    info!(elapsed_ms = started.elapsed().as_millis(), "All models evaluated");

    let report = Report {
        rows: field.rows(),
        cols: field.cols(),
        frames: field.n_samples(),
        sampling_rate_hz: field.sampling_rate(),
        simulated_frequency_hz: args.frequency,
        identified_frequency_hz: peak.frequency,
        peak_power: peak.power,
        location,
        models,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    Ok(())
}
