//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks on material and spectral settings.
//!
//! The raw TOML is parsed into a `toml::Value` first and its key tree is
//! compared against the known field names. Unknown keys only produce
//! warnings; the serde pass that follows decides what is accepted.

use std::collections::HashSet;

use super::AnalysisConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `AnalysisConfig`.
///
/// Kept by hand in step with the structs in analysis_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [material]
        "material",
        "material.slope_k",
        "material.strength_c",
        "material.endurance_limit",
        // [spectral]
        "spectral",
        "spectral.band_pass",
        "spectral.roi_size",
        "spectral.segment_length",
        "spectral.overlap",
        // [estimation]
        "estimation",
        "estimation.model",
        "estimation.frequency",
        "estimation.modal_span",
        "estimation.region_mode",
        "estimation.threads",
        // [estimation.location]
        "estimation.location",
        "estimation.location.row",
        "estimation.location.col",
        "estimation.location.height",
        "estimation.location.width",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collects the dotted key paths of a `toml::Value` tree.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        // Tie-break on the key so the suggestion does not depend on hash order
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every unknown key in a raw TOML document.
///
/// Syntax errors yield no warnings; they surface in the serde pass.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Range checks on a parsed `AnalysisConfig`.
///
/// Returns `(errors, warnings)`: errors are values no analysis can run with,
/// warnings are unusual but usable.
pub fn validate_physical_ranges(config: &AnalysisConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let m = &config.material;
    if m.slope_k <= 1.0 {
        errors.push(format!("material.slope_k = {} must be > 1", m.slope_k));
    } else if m.slope_k > 20.0 {
        warnings.push(ValidationWarning {
            field: "material.slope_k".to_string(),
            message: format!(
                "slope_k = {:.1} is outside the typical S-N range (3-15)",
                m.slope_k
            ),
            suggestion: None,
        });
    }
    if m.strength_c <= 0.0 {
        errors.push(format!("material.strength_c = {:e} must be > 0", m.strength_c));
    }
    if let Some(limit) = m.endurance_limit {
        if limit < 0.0 {
            errors.push(format!(
                "material.endurance_limit = {limit:.2} cannot be negative"
            ));
        }
    }

    let s = &config.spectral;
    if let Some([low, high]) = s.band_pass {
        if low < 0.0 || low >= high {
            errors.push(format!(
                "spectral.band_pass = [{low}, {high}] must satisfy 0 <= low < high"
            ));
        }
    }
    if s.roi_size == 0 {
        errors.push("spectral.roi_size must be at least 1 pixel".to_string());
    } else if s.roi_size > 50 {
        warnings.push(ValidationWarning {
            field: "spectral.roi_size".to_string(),
            message: format!(
                "roi_size = {} averages a large region and may smear the mode shape",
                s.roi_size
            ),
            suggestion: None,
        });
    }
    if s.segment_length < 2 {
        errors.push(format!(
            "spectral.segment_length = {} must be at least 2",
            s.segment_length
        ));
    }
    if !(0.0..1.0).contains(&s.overlap) {
        errors.push(format!(
            "spectral.overlap = {} must lie in [0, 1)",
            s.overlap
        ));
    }

    let e = &config.estimation;
    if let Some(freq) = e.frequency {
        if freq <= 0.0 {
            errors.push(format!("estimation.frequency = {freq} must be > 0"));
        }
    }
    if let Some(span) = e.modal_span {
        if span <= 0.0 {
            errors.push(format!(
                "estimation.modal_span = {span} must be > 0 (remove it for the single-line modal estimate)"
            ));
        }
    }
    if let Some(location) = e.location {
        if location.height == 0 || location.width == 0 {
            errors.push("estimation.location must cover at least one pixel".to_string());
        }
    }
    if e.threads == Some(0) {
        errors.push("estimation.threads must be at least 1 (remove it to use all cores)".to_string());
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
