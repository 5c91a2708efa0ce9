//! WGS-84 ellipsoid parameters, gravity, and Olson's ECEF→LLA coefficients.
//!
//! Grouped in one place so they are derived once, not re-computed per call
//! (see the "Constants" design note: group WGS-84/Olson coefficients in an
//! immutable module).

/// WGS-84 semi-major axis, meters.
pub const SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;

/// WGS-84 first eccentricity squared.
pub const E2: f64 = 6.694_379_990_141_316e-3;

/// Standard gravity, m/s^2.
pub const GRAVITY_MPS2: f32 = 9.806_65;

/// Olson's closed-form ECEF→LLA coefficients (Olson, D.K., 1996,
/// "Converting Earth-Centered, Earth-Fixed Coordinates to Geodetic
/// Coordinates", IEEE Trans. Aerospace & Electronic Systems).
///
/// These are derived from `SEMI_MAJOR_AXIS_M` and `E2` but kept as literal
/// constants to match the published/reference coefficients exactly rather
/// than re-deriving them in floating point at startup.
pub const A1: f64 = SEMI_MAJOR_AXIS_M * E2;
pub const A2: f64 = A1 * A1;
pub const A3: f64 = A1 * E2 / 2.0;
pub const A4: f64 = 2.5 * A2;
pub const A5: f64 = A1 + A3;
pub const A6: f64 = 1.0 - E2;

/// Degenerate-input radius threshold for `ecef2lla`: inputs closer to the
/// Earth's center than this are rejected (§7, "Degenerate geodetic input").
pub const ECEF2LLA_MIN_RADIUS_M: f64 = 100_000.0;
