// src/encode/wavelet/constants.rs

//! CDF 9/7 lifting factorization coefficients.

/// First predict step weight.
pub const ALPHA: f32 = -1.586134342;

/// First update step weight.
pub const BETA: f32 = -0.05298011854;

/// Second predict step weight.
pub const GAMMA: f32 = 0.8829110762;

/// Second update step weight.
pub const DELTA: f32 = 0.44355068522;

/// Scaling: low band is multiplied by `XI`, high band divided by it.
pub const XI: f32 = 1.149604398;
