//! Lightweight unit carriers.
//!
//! Per the unit-safety design note, latitude/longitude/altitude and rate
//! quantities are wrapped so a caller cannot pass a velocity where an angle
//! is expected and have it compile. Internal matrix/quaternion math still
//! operates on plain `f32`/`f64` immediately after unwrapping — these
//! newtypes exist at the public surface only.

use core::ops::{Add, Sub};

/// An angle in radians (`f64`, used for geodetic latitude/longitude).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, defmt::Format)]
pub struct Radians(pub f64);

/// A length in meters (`f64`, used for altitude and geodetic distances).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, defmt::Format)]
pub struct Meters(pub f64);

/// A rate in meters per second (`f32`, used for NED velocity components).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, defmt::Format)]
pub struct MetersPerSecond(pub f32);

/// A rate in radians per second (`f32`, used for body-frame angular rate).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, defmt::Format)]
pub struct RadiansPerSecond(pub f32);

/// An acceleration in meters per second squared (`f32`, used for
/// bias-corrected specific force).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, defmt::Format)]
pub struct MetersPerSecondSquared(pub f32);

/// A magnetic field strength in microtesla (`f32`, magnetometer input).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, defmt::Format)]
pub struct Microtesla(pub f32);

/// A single-precision angle (`f32`, used for Euler attitude angles).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, defmt::Format)]
pub struct Angle(pub f32);

/// A scalar unit that can be built from, and unwrapped to, a plain `f32`.
/// Lets [`Vec3`] be generic over which physical quantity it carries.
pub trait Scalar: Copy {
    fn from_f32(v: f32) -> Self;
    fn raw(self) -> f32;
}

macro_rules! impl_scalar_f32 {
    ($t:ty) => {
        impl Scalar for $t {
            fn from_f32(v: f32) -> Self {
                <$t>::new(v)
            }
            fn raw(self) -> f32 {
                self.0
            }
        }
    };
}

impl_scalar_f32!(MetersPerSecond);
impl_scalar_f32!(RadiansPerSecond);
impl_scalar_f32!(MetersPerSecondSquared);
impl_scalar_f32!(Microtesla);
impl_scalar_f32!(Angle);

/// A 3-vector whose components carry a physical unit, e.g.
/// `Vec3<RadiansPerSecond>` for a body-frame angular rate. Prevents, at
/// the type level, passing a gyro reading where an accelerometer reading
/// is expected even though both are geometrically `[f32; 3]`.
#[derive(Clone, Copy, Debug, Default, defmt::Format)]
pub struct Vec3<U> {
    pub x: U,
    pub y: U,
    pub z: U,
}

impl<U: Scalar> Vec3<U> {
    pub fn from_array(a: [f32; 3]) -> Self {
        Self {
            x: U::from_f32(a[0]),
            y: U::from_f32(a[1]),
            z: U::from_f32(a[2]),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x.raw(), self.y.raw(), self.z.raw()]
    }
}

macro_rules! newtype_arith {
    ($t:ty, $inner:ty) => {
        impl Add for $t {
            type Output = $t;
            fn add(self, rhs: $t) -> $t {
                <$t>::new(self.0 + rhs.0)
            }
        }
        impl Sub for $t {
            type Output = $t;
            fn sub(self, rhs: $t) -> $t {
                <$t>::new(self.0 - rhs.0)
            }
        }
        impl From<$inner> for $t {
            fn from(v: $inner) -> Self {
                <$t>::new(v)
            }
        }
    };
}

impl Radians {
    pub const fn new(v: f64) -> Self {
        Self(v)
    }
}
impl Meters {
    pub const fn new(v: f64) -> Self {
        Self(v)
    }
}
impl MetersPerSecond {
    pub const fn new(v: f32) -> Self {
        Self(v)
    }
}
impl RadiansPerSecond {
    pub const fn new(v: f32) -> Self {
        Self(v)
    }
}
impl MetersPerSecondSquared {
    pub const fn new(v: f32) -> Self {
        Self(v)
    }
}
impl Microtesla {
    pub const fn new(v: f32) -> Self {
        Self(v)
    }
}
impl Angle {
    pub const fn new(v: f32) -> Self {
        Self(v)
    }
}

newtype_arith!(Radians, f64);
newtype_arith!(Meters, f64);
newtype_arith!(MetersPerSecond, f32);
newtype_arith!(RadiansPerSecond, f32);
newtype_arith!(MetersPerSecondSquared, f32);
newtype_arith!(Microtesla, f32);
newtype_arith!(Angle, f32);
