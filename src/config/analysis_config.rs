//! Analysis Configuration - material curve, spectral settings and estimation
//! options as TOML values
//!
//! Every section implements `Default`, so an empty file (or no file at all)
//! yields a runnable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::FatigueError;
use crate::fatigue::FatigueEstimator;
use crate::processing::{
    SpectralAnalyzer, WelchConfig, DEFAULT_OVERLAP, DEFAULT_ROI_SIZE, DEFAULT_SEGMENT_LENGTH,
};
use crate::types::{
    BandPass, EstimateOptions, FatigueCurveParams, FatigueModel, Location, RegionMode,
};

/// Environment variable pointing at a configuration file.
pub const CONFIG_ENV_VAR: &str = "IRFLIFE_CONFIG";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "irflife.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of an analysis run.
///
/// Load with `AnalysisConfig::load()` which searches:
/// 1. `$IRFLIFE_CONFIG` env var
/// 2. `./irflife.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// S-N curve of the material
    #[serde(default)]
    pub material: MaterialConfig,

    /// Resonance search and PSD estimation
    #[serde(default)]
    pub spectral: SpectralConfig,

    /// Model choice and per-call options
    #[serde(default)]
    pub estimation: EstimationConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$IRFLIFE_CONFIG` environment variable
    /// 2. `./irflife.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), model = %config.estimation.model, "Loaded analysis config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(model = %config.estimation.model, "Loaded analysis config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Two-pass: check for unknown keys first (warnings only)
        for w in &super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Analysis config saved");
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (mut errors, range_warnings) = super::validation::validate_physical_ranges(self);
        for w in &range_warnings {
            warn!("{}", w);
        }

        // Every float must be finite
        if let Ok(value) = toml::Value::try_from(self) {
            let mut bad = Vec::new();
            collect_non_finite(&value, "", &mut bad);
            if !bad.is_empty() {
                errors.push(format!(
                    "Config contains NaN or Inf values ({}): all numbers must be finite",
                    bad.join(", ")
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    // ------------------------------------------------------------------------
    // Conversions into analysis types
    // ------------------------------------------------------------------------

    pub fn curve_params(&self) -> Result<FatigueCurveParams, FatigueError> {
        let m = &self.material;
        let params = FatigueCurveParams {
            slope_k: m.slope_k,
            strength_c: m.strength_c,
            endurance_limit: m.endurance_limit,
        };
        params.validate()?;
        Ok(params)
    }

    /// Configured resonance band, `None` for the full spectrum.
    pub fn band_pass(&self) -> Result<Option<BandPass>, FatigueError> {
        self.spectral
            .band_pass
            .map(|[low, high]| BandPass::new(low, high))
            .transpose()
    }

    pub const fn welch_config(&self) -> WelchConfig {
        WelchConfig {
            segment_length: self.spectral.segment_length,
            overlap: self.spectral.overlap,
        }
    }

    pub fn spectral_analyzer(&self) -> Result<SpectralAnalyzer, FatigueError> {
        SpectralAnalyzer::new(self.welch_config(), self.spectral.roi_size)
    }

    pub fn estimator(&self) -> Result<FatigueEstimator, FatigueError> {
        Ok(FatigueEstimator::new(self.spectral_analyzer()?).with_threads(self.estimation.threads))
    }

    pub const fn estimate_options(&self) -> EstimateOptions {
        let e = &self.estimation;
        EstimateOptions {
            location: e.location,
            frequency: e.frequency,
            modal_span: e.modal_span,
            region_mode: e.region_mode,
        }
    }
}

/// Dotted paths of every float in `value` that is NaN or infinite.
fn collect_non_finite(value: &toml::Value, path: &str, out: &mut Vec<String>) {
    match value {
        toml::Value::Float(f) if !f.is_finite() => out.push(path.to_string()),
        toml::Value::Table(table) => {
            for (key, v) in table {
                let child = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                collect_non_finite(v, &child, out);
            }
        }
        toml::Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                collect_non_finite(v, &format!("{path}[{i}]"), out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Material
// ============================================================================

/// Basquin curve `N = C / s^k` on stress amplitude (MPa).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// S-N slope k (> 1)
    #[serde(default = "default_slope_k")]
    pub slope_k: f64,

    /// Fatigue-strength coefficient C (MPa^k)
    #[serde(default = "default_strength_c")]
    pub strength_c: f64,

    /// Endurance limit B (MPa amplitude); unset means no limit
    #[serde(default)]
    pub endurance_limit: Option<f64>,
}

fn default_slope_k() -> f64 { 3.0 }
// 50 MPa amplitude at 2e6 cycles
fn default_strength_c() -> f64 { 2.5e11 }

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            slope_k: default_slope_k(),
            strength_c: default_strength_c(),
            endurance_limit: None,
        }
    }
}

// ============================================================================
// Spectral
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Resonance search band `[low, high]` in Hz; `None` searches the full
    /// spectrum (only reachable from code, an omitted key means the default)
    #[serde(default = "default_band_pass")]
    pub band_pass: Option<[f64; 2]>,

    /// Side of the square ROI averaged around a picked pixel
    #[serde(default = "default_roi_size")]
    pub roi_size: usize,

    /// Welch segment length (samples)
    #[serde(default = "default_segment_length")]
    pub segment_length: usize,

    /// Welch segment overlap fraction
    #[serde(default = "default_overlap")]
    pub overlap: f64,
}

#[allow(clippy::unnecessary_wraps)]
fn default_band_pass() -> Option<[f64; 2]> { Some([5.0, 100.0]) }
fn default_roi_size() -> usize { DEFAULT_ROI_SIZE }
fn default_segment_length() -> usize { DEFAULT_SEGMENT_LENGTH }
fn default_overlap() -> f64 { DEFAULT_OVERLAP }

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            band_pass: default_band_pass(),
            roi_size: default_roi_size(),
            segment_length: default_segment_length(),
            overlap: default_overlap(),
        }
    }
}

// ============================================================================
// Estimation
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// Rainflow, Dirlik, TovoBenasciutti or Modal
    #[serde(default)]
    pub model: FatigueModel,

    /// Resonant frequency (Hz) for the modal model; identified when unset
    #[serde(default)]
    pub frequency: Option<f64>,

    /// Half-width (Hz) of the modal spectral window
    #[serde(default)]
    pub modal_span: Option<f64>,

    /// `mean_series` or `mean_life`
    #[serde(default)]
    pub region_mode: RegionMode,

    /// Region to evaluate; the whole field when unset
    #[serde(default)]
    pub location: Option<Location>,

    /// Worker threads for full-field passes; all cores when unset
    #[serde(default)]
    pub threads: Option<usize>,
}
