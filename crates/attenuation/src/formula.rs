//! Exponential depth attenuation.
//!
//! ```text
//! k      = 22² · (1/REI)^(2/3) · g^(1/3)
//! factor = exp(−k · max(depth, floor))
//! ```
//!
//! Depths at or below the floor (land and very shallow cells) are raised to
//! the floor so the factor never exceeds 1.

/// Standard gravity (m/s²).
pub const GRAVITY: f64 = 9.80665;

/// Scale coefficient of the decay constant.
pub const DECAY_COEFFICIENT: f64 = 22.0 * 22.0;

/// Default land-mask floor (m).
pub const DEFAULT_DEPTH_FLOOR: f64 = 1.0;

/// Replacement for slope cells that are exactly zero.
pub const ZERO_SLOPE_REPLACEMENT: f64 = 0.1;

/// Decay constant for an exposure value. Only meaningful for `rei > 0`.
pub fn decay_constant(rei: f64) -> f64 {
    DECAY_COEFFICIENT * (1.0 / rei).powf(2.0 / 3.0) * GRAVITY.cbrt()
}

/// Whether an exposure value lies in the domain of [`decay_constant`].
pub fn is_valid_exposure(rei: f64) -> bool {
    rei.is_finite() && rei > 0.0
}

/// Depth after land-mask substitution.
#[inline]
pub fn effective_depth(depth: f64, floor: f64) -> f64 {
    if depth <= floor {
        floor
    } else {
        depth
    }
}

/// `exp(−k · max(depth, floor))`.
pub fn attenuation_factor(k: f64, depth: f64, floor: f64) -> f64 {
    (-k * effective_depth(depth, floor)).exp()
}

/// Slope multiplier: zero slope becomes 0.1, anything else passes through.
#[inline]
pub fn slope_term(slope: f64) -> f64 {
    if slope == 0.0 {
        ZERO_SLOPE_REPLACEMENT
    } else {
        slope
    }
}
