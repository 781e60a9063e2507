//! Analysis Configuration Module
//!
//! Material curve, spectral settings and estimation options loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `IRFLIFE_CONFIG` environment variable (path to TOML file)
//! 2. `irflife.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ```no_run
//! # fn run(field: &irflife::StressField) -> irflife::Result<()> {
//! use irflife::AnalysisConfig;
//!
//! let config = AnalysisConfig::load();
//! let estimator = config.estimator()?;
//! let life = estimator.estimate_life(
//!     field,
//!     &config.curve_params()?,
//!     config.estimation.model,
//!     &config.estimate_options(),
//! )?;
//! # let _ = life;
//! # Ok(())
//! # }
//! ```

mod analysis_config;
pub mod validation;

pub use analysis_config::*;
