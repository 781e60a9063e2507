//! IR-FLife: fatigue life identification from thermoelastic stress fields
//!
//! A thermal camera recording, converted to stress, gives a `[t, row, col]`
//! field. This crate finds the resonant frequency of the structure in that
//! field and estimates fatigue life per location or per pixel.
//!
//! ## Modules
//!
//! - **types**: stress field, regions, frequency bands, curve parameters, model selection
//! - **processing**: FFT, Welch PSD, spectral moments, resonance identification
//! - **fatigue**: rainflow, Dirlik, Tovo-Benasciutti and modal damage models
//! - **spatial**: parallel full-field maps with progress and cancellation
//! - **config**: TOML analysis configuration with validation

pub mod config;
pub mod error;
pub mod fatigue;
pub mod processing;
pub mod spatial;
pub mod types;

pub use config::{AnalysisConfig, ConfigError};
pub use error::{FatigueError, Result};
pub use fatigue::FatigueEstimator;
pub use processing::{SpectralAnalyzer, SpectralMoments, WelchConfig};
pub use spatial::{CellStatus, FieldMap, FieldTask, LifeMap, ProgressHandle};
pub use types::{
    BandPass, EstimateOptions, FatigueCurveParams, FatigueModel, FatigueResult, Location,
    RegionMode, StressField, INFINITE_LIFE,
};
