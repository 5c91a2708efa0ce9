//! Input samples and the nominal INS state reported to the caller (§3, §6).

use crate::units::{
    Angle, Meters, MetersPerSecond, MetersPerSecondSquared, Microtesla, Radians, RadiansPerSecond,
    Vec3,
};

/// Geodetic position, WGS-84.
#[derive(Clone, Copy, Debug, Default, defmt::Format)]
pub struct LlaPos {
    pub lat: Radians,
    pub lon: Radians,
    pub alt: Meters,
}

impl LlaPos {
    pub fn new(lat_rad: f64, lon_rad: f64, alt_m: f64) -> Self {
        Self {
            lat: Radians::new(lat_rad),
            lon: Radians::new(lon_rad),
            alt: Meters::new(alt_m),
        }
    }

    pub(crate) fn as_tuple(self) -> (f64, f64, f64) {
        (self.lat.0, self.lon.0, self.alt.0)
    }

    pub(crate) fn from_tuple(t: (f64, f64, f64)) -> Self {
        Self::new(t.0, t.1, t.2)
    }
}

/// Euler attitude, body→NED, radians.
#[derive(Clone, Copy, Debug, Default, defmt::Format)]
pub struct EulerAngles {
    pub roll: Angle,
    pub pitch: Angle,
    pub yaw: Angle,
}

impl EulerAngles {
    pub(crate) fn from_tuple(t: (f32, f32, f32)) -> Self {
        Self {
            roll: Angle::new(t.0),
            pitch: Angle::new(t.1),
            yaw: Angle::new(t.2),
        }
    }
}

/// An IMU sample: bias-uncorrected body-frame specific force and angular
/// rate (§6, "Inputs consumed").
#[derive(Clone, Copy, Debug, Default)]
pub struct ImuSample {
    pub accel: Vec3<MetersPerSecondSquared>,
    pub gyro: Vec3<RadiansPerSecond>,
}

impl ImuSample {
    pub fn new(accel_mps2: [f32; 3], gyro_radps: [f32; 3]) -> Self {
        Self {
            accel: Vec3::from_array(accel_mps2),
            gyro: Vec3::from_array(gyro_radps),
        }
    }
}

/// A magnetometer sample, initialization only (§6).
#[derive(Clone, Copy, Debug, Default)]
pub struct MagSample {
    pub field: Vec3<Microtesla>,
}

impl MagSample {
    pub fn new(field_ut: [f32; 3]) -> Self {
        Self {
            field: Vec3::from_array(field_ut),
        }
    }
}

/// A GNSS fix: geodetic position and NED velocity (§6).
#[derive(Clone, Copy, Debug, Default)]
pub struct GnssFix {
    pub lla_pos: LlaPos,
    pub ned_vel: Vec3<MetersPerSecond>,
}

impl GnssFix {
    pub fn new(lla_pos: LlaPos, ned_vel_mps: [f32; 3]) -> Self {
        Self {
            lla_pos,
            ned_vel: Vec3::from_array(ned_vel_mps),
        }
    }
}

/// The nominal INS estimate reported to the caller after every update
/// (§3, "Nominal INS state").
#[derive(Clone, Copy, Debug, Default, defmt::Format)]
pub struct Ins {
    pub lla_pos: LlaPos,
    pub ned_vel: Vec3<MetersPerSecond>,
    pub attitude: EulerAngles,
    pub accel: Vec3<MetersPerSecondSquared>,
    pub gyro: Vec3<RadiansPerSecond>,
}
