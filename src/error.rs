//! Error taxonomy for spectral analysis and fatigue estimation

use thiserror::Error;

/// Errors raised by the analysis core.
///
/// Contract violations (`InvalidLocation`, `InvalidBand`, `MissingFrequency`,
/// `UnknownModel`, ...) abort the call. Signal-level problems
/// (`DegenerateSignal`, `NonFiniteSignal`) are recoverable: full-field passes
/// record them as sentinels and keep going.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FatigueError {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid band-pass [{low:.3}, {high:.3}] Hz: {reason}")]
    InvalidBand { low: f64, high: f64, reason: String },

    #[error("Modal model requires a resonant frequency")]
    MissingFrequency,

    #[error("Resonant frequency must be a positive number of Hz, got {0}")]
    InvalidFrequency(f64),

    #[error("Unknown fatigue model '{0}' (expected Rainflow, Dirlik, TovoBenasciutti or Modal)")]
    UnknownModel(String),

    #[error("Degenerate signal: {0}")]
    DegenerateSignal(String),

    #[error("Signal contains non-finite samples")]
    NonFiniteSignal,

    #[error("Invalid fatigue curve parameters: {0}")]
    InvalidCurveParams(String),

    #[error("Frequency span around the natural frequency must not be zero: leave it unset or use a positive value")]
    InvalidFrequencySpan(f64),

    #[error("Invalid stress field: {0}")]
    InvalidField(String),

    #[error("Spectral estimation error: {0}")]
    Spectral(String),

    #[error("Worker pool error: {0}")]
    ThreadPool(String),
}

impl FatigueError {
    /// Whether a full-field pass may absorb this error as a per-pixel sentinel.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateSignal(_) | Self::NonFiniteSignal)
    }
}

pub type Result<T> = std::result::Result<T, FatigueError>;
