//! Physical and astronomical constants used by the shading model.
//!
//! Kept in one place so the simplified models can be audited or swapped
//! for measured data sources without touching the simulation code.

// -- Solar geometry --

/// Amplitude of the solar declination sine model [deg].
pub const DECLINATION_AMPLITUDE: f64 = 23.45;

/// Day-of-year offset of the spring equinox used by declination and EoT.
pub const EQUINOX_DAY_OFFSET: f64 = 81.0;

/// Period of the declination sine [days].
pub const DECLINATION_PERIOD_DAYS: f64 = 365.0;

/// Period of the equation-of-time intermediate angle B [days].
pub const EOT_PERIOD_DAYS: f64 = 364.0;

/// Equation of time coefficients [minutes]: `a sin 2B - b cos B - c sin B`.
pub const EOT_SIN_2B: f64 = 9.87;
pub const EOT_COS_B: f64 = 7.53;
pub const EOT_SIN_B: f64 = 1.5;

pub const DEGREES_PER_HOUR: f64 = 15.0;
pub const SOLAR_NOON_HOUR: f64 = 12.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;

// -- Clear-sky irradiance --

/// Extraterrestrial irradiance used by the Meinel approximation [W/m²].
pub const SOLAR_CONSTANT: f64 = 1353.0;

/// Atmospheric transmittance base in `I0 * T^(AM^k)`.
pub const ATMOSPHERIC_TRANSMITTANCE: f64 = 0.7;

/// Air-mass exponent `k` in `I0 * T^(AM^k)`.
pub const AIR_MASS_EXPONENT: f64 = 0.678;

/// Kasten–Young air mass: `1 / (cos z + A (B - z)^C)`, z in degrees.
pub const KASTEN_YOUNG_A: f64 = 0.50572;
pub const KASTEN_YOUNG_B: f64 = 96.07995;
pub const KASTEN_YOUNG_C: f64 = -1.6364;

// -- Numerical safeguards --

/// Profile slope substituted when the sun sits in the tracker axis plane.
pub const PROFILE_SLOPE_SENTINEL: f64 = 1000.0;

/// Sun vectors with a vertical component at or below this cast no ground shadow.
pub const MIN_SUN_Z: f64 = 1e-9;
