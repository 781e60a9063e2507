//! S-N curve and damage accumulation building blocks

use statrs::function::gamma::{checked_gamma_ur, gamma};

use crate::types::{FatigueCurveParams, INFINITE_LIFE};

/// Miner's Rule for cumulative fatigue damage
///
/// Damage contributed by `cycles` cycles at a level that fails after
/// `cycles_to_failure` cycles: D = n / N
///
/// An infinite `cycles_to_failure` (below the endurance limit) does no damage.
pub fn miners_rule(cycles: f64, cycles_to_failure: f64) -> f64 {
    if cycles_to_failure.is_infinite() {
        return 0.0;
    }
    if cycles_to_failure <= 0.0 {
        return 1.0; // Fully damaged if invalid rating
    }
    cycles / cycles_to_failure
}

/// Basquin damage of one cycle of amplitude `amplitude`: `s^k / C`.
pub fn basquin_damage(amplitude: f64, params: &FatigueCurveParams) -> f64 {
    miners_rule(1.0, params.cycles_to_failure(amplitude))
}

/// Time to failure for `damage` accumulated over `duration` seconds.
pub fn life_from_damage(duration: f64, damage: f64) -> f64 {
    if !(damage > 0.0) || !damage.is_finite() {
        return INFINITE_LIFE;
    }
    duration / damage
}

/// Time to failure for a damage rate in 1/s.
pub fn life_from_rate(rate: f64) -> f64 {
    life_from_damage(1.0, rate)
}

/// Regularized upper incomplete gamma `Q(a, x)`; `Q(a, 0) = 1`.
pub fn upper_gamma_fraction(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    checked_gamma_ur(a, x).unwrap_or(0.0)
}

/// Truncated moment `E[s^k; s > threshold]` of a Rayleigh amplitude with
/// scale `sigma`.
pub fn rayleigh_moment(sigma: f64, k: f64, threshold: f64) -> f64 {
    if !(sigma > 0.0) {
        return 0.0;
    }
    let a = 1.0 + k / 2.0;
    let scale = (2.0_f64.sqrt() * sigma).powf(k);
    scale * gamma(a) * upper_gamma_fraction(a, threshold * threshold / (2.0 * sigma * sigma))
}

/// Truncated moment `E[s^k; s > threshold]` of an exponential amplitude with
/// mean `theta`.
pub fn exponential_moment(theta: f64, k: f64, threshold: f64) -> f64 {
    if !(theta > 0.0) {
        return 0.0;
    }
    let a = 1.0 + k;
    theta.powf(k) * gamma(a) * upper_gamma_fraction(a, threshold / theta)
}
