//! Mathematical and numerical constants

/// 0.5 ln(2π)
pub const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;
/// ln(2π)
pub const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Dishes whose probability of having arrived stays at or below this value
/// are not tracked by the analytical recursion.
pub const DISH_CUTOFF: f64 = 1e-8;

/// Smallest Beta shape parameter handed to the stick-length sampler.
/// Posterior summaries occasionally carry zero or negative shapes.
pub const BETA_PARAM_FLOOR: f64 = 1e-10;
