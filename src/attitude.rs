//! Quaternion/Euler/DCM attitude utilities, the skew-symmetric operator,
//! local LLA rate, and the tilt-compass initial-attitude estimator.
//!
//! All math here is single precision, in the style of a Mahony-filter
//! attitude estimator that keeps its state as plain `f32` fields and
//! hand-expands the Hamilton product / rotation formulas rather than
//! pulling in a quaternion crate.

use micromath::F32Ext;

use crate::constants::{E2, SEMI_MAJOR_AXIS_M};
use crate::linalg::Mat;

/// Unit quaternion, scalar-first (`w, x, y, z`), body→NED.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Hamilton product `self ⊗ rhs`.
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }

    /// Normalize, then flip the sign of all components if `w < 0` so the
    /// filter's quaternion representation is unique (§4.4 step 2, §7
    /// "Quaternion sign flip").
    pub fn normalize_sign_flip(self) -> Self {
        let norm = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        let q = if norm > 1e-9 {
            let inv = 1.0 / norm;
            Self {
                w: self.w * inv,
                x: self.x * inv,
                y: self.y * inv,
                z: self.z * inv,
            }
        } else {
            Self::IDENTITY
        };
        if q.w < 0.0 {
            defmt::trace!("quaternion sign flip");
            Self {
                w: -q.w,
                x: -q.x,
                y: -q.y,
                z: -q.z,
            }
        } else {
            q
        }
    }

    /// Small-angle attitude-error quaternion `(1, v)`, used by both the
    /// gyro propagation increment and the measurement-update correction.
    pub fn from_small_angle(v: [f32; 3]) -> Self {
        Self {
            w: 1.0,
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }

    /// `angle2quat`: ZYX (yaw-pitch-roll) Euler to quaternion.
    pub fn from_euler(roll: f32, pitch: f32, yaw: f32) -> Self {
        let cr = (roll * 0.5).cos();
        let sr = (roll * 0.5).sin();
        let cp = (pitch * 0.5).cos();
        let sp = (pitch * 0.5).sin();
        let cy = (yaw * 0.5).cos();
        let sy = (yaw * 0.5).sin();

        Self {
            w: cr * cp * cy + sr * sp * sy,
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
        }
    }

    /// `quat2angle`: quaternion to ZYX Euler, clamping the `asin` argument
    /// so ±90° pitch does not produce `NaN` (§4.2).
    pub fn to_euler(self) -> (f32, f32, f32) {
        let Quaternion { w, x, y, z } = self;

        let sinr_cosp = 2.0 * (w * x + y * z);
        let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
        let roll = sinr_cosp.atan2(cosr_cosp);

        let sinp = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
        let pitch = sinp.asin();

        let siny_cosp = 2.0 * (w * z + x * y);
        let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
        let yaw = siny_cosp.atan2(cosy_cosp);

        (roll, pitch, yaw)
    }

    /// `quat2dcm`: body→NED direction cosine matrix, i.e. `C_b2n` directly —
    /// `mul_vec(&q.to_dcm(), &body_vec)` gives the same vector expressed in
    /// NED. Time update builds `C_b2n` straight from this, with no further
    /// transpose.
    pub fn to_dcm(self) -> Mat<3, 3> {
        let Quaternion { w, x, y, z } = self;
        let (w2, x2, y2, z2) = (w * w, x * x, y * y, z * z);
        [
            [w2 + x2 - y2 - z2, 2.0 * (x * y - w * z), 2.0 * (x * z + w * y)],
            [2.0 * (x * y + w * z), w2 - x2 + y2 - z2, 2.0 * (y * z - w * x)],
            [2.0 * (x * z - w * y), 2.0 * (y * z + w * x), w2 - x2 - y2 + z2],
        ]
    }
}

/// `Skew(v)`: the 3×3 skew-symmetric matrix such that `Skew(v) * u == v × u`.
pub fn skew(v: [f32; 3]) -> Mat<3, 3> {
    [
        [0.0, -v[2], v[1]],
        [v[2], 0.0, -v[0]],
        [-v[1], v[0], 0.0],
    ]
}

/// `LlaRate`: NED velocity to (dlat/dt, dlon/dt, dalt/dt), double precision
/// (§4.2). `lla` is `(lat rad, lon rad, alt m)`.
pub fn lla_rate(ned_vel: [f32; 3], lla: (f64, f64, f64)) -> (f64, f64, f64) {
    let (lat, _lon, alt) = lla;
    let sin_lat = libm::sin(lat);
    let denom = 1.0 - E2 * sin_lat * sin_lat;
    let rns = SEMI_MAJOR_AXIS_M * (1.0 - E2) / (denom * libm::sqrt(denom));
    let rew = SEMI_MAJOR_AXIS_M / libm::sqrt(denom);

    let v_n = ned_vel[0] as f64;
    let v_e = ned_vel[1] as f64;
    let v_d = ned_vel[2] as f64;

    let dlat = v_n / (rns + alt);
    let dlon = v_e / ((rew + alt) * libm::cos(lat));
    let dalt = -v_d;
    (dlat, dlon, dalt)
}

/// `TiltCompass`: roll/pitch from the accelerometer's gravity direction,
/// heading from the tilt-compensated magnetometer projected onto the
/// horizontal plane. Returns Euler `(roll, pitch, yaw)` radians.
pub fn tilt_compass(accel_body: [f32; 3], mag_body: [f32; 3]) -> (f32, f32, f32) {
    let (ax, ay, az) = (accel_body[0], accel_body[1], accel_body[2]);

    // Specific force at rest is -g_NED expressed in body axes (§4.4 step
    // 4: v_dot = C_b2n*a_b + g_NED, v_dot = 0 at rest), so a level body
    // reads az ≈ -g, not +g. Roll/pitch recovered from the direction of
    // specific force (valid only under quasi-static conditions, consistent
    // with "initial-alignment helper" scope).
    let roll = (-ay).atan2(-az);
    let pitch = ax.atan2((ay * ay + az * az).sqrt());

    let (mx, my, mz) = (mag_body[0], mag_body[1], mag_body[2]);
    let (sr, cr) = (roll.sin(), roll.cos());
    let (sp, cp) = (pitch.sin(), pitch.cos());

    // Tilt-compensated horizontal magnetic field components.
    let mx_h = mx * cp + my * sr * sp + mz * cr * sp;
    let my_h = my * cr - mz * sr;

    let yaw = (-my_h).atan2(mx_h);

    (roll, pitch, yaw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_quaternion_is_zero_euler() {
        let q = Quaternion::IDENTITY;
        let (r, p, y) = q.to_euler();
        assert!(r.abs() < 1e-6 && p.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn euler_quat_roundtrip_away_from_gimbal_lock() {
        let cases = [
            (0.2f32, 0.3f32, 0.4f32),
            (-1.0, 0.5, -2.0),
            (0.05, -1.3, 3.0),
        ];
        for (roll, pitch, yaw) in cases {
            let q = Quaternion::from_euler(roll, pitch, yaw);
            let (r2, p2, y2) = q.to_euler();
            assert!((r2 - roll).abs() < 1e-4, "roll {r2} vs {roll}");
            assert!((p2 - pitch).abs() < 1e-4, "pitch {p2} vs {pitch}");
            assert!((y2 - yaw).abs() < 1e-4, "yaw {y2} vs {yaw}");
        }
    }

    #[test]
    fn quat2angle_handles_gimbal_lock_without_nan() {
        let q = Quaternion::from_euler(0.0, core::f32::consts::FRAC_PI_2, 0.0);
        let (_, pitch, _) = q.to_euler();
        assert!(!pitch.is_nan());
        assert!((pitch - core::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn dcm_is_orthonormal() {
        let q = Quaternion::from_euler(0.3, -0.6, 1.1).normalize_sign_flip();
        let r = q.to_dcm();
        let rt = crate::linalg::transpose(&r);
        let i = crate::linalg::mul(&r, &rt);
        for a in 0..3 {
            for b in 0..3 {
                let expect = if a == b { 1.0 } else { 0.0 };
                assert!((i[a][b] - expect).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn sign_flip_keeps_w_nonnegative() {
        let q = Quaternion {
            w: -0.9,
            x: 0.1,
            y: 0.2,
            z: 0.3,
        };
        let q2 = q.normalize_sign_flip();
        assert!(q2.w >= 0.0);
    }

    #[test]
    fn skew_matches_cross_product() {
        let v = [1.0f32, 2.0, 3.0];
        let u = [4.0f32, 5.0, 6.0];
        let s = skew(v);
        let out = crate::linalg::mul_vec(&s, &u);
        let expect = [
            v[1] * u[2] - v[2] * u[1],
            v[2] * u[0] - v[0] * u[2],
            v[0] * u[1] - v[1] * u[0],
        ];
        for i in 0..3 {
            assert!((out[i] - expect[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn tilt_compass_level_north_facing_is_zero_zero_zero() {
        let (roll, pitch, yaw) = tilt_compass([0.0, 0.0, -9.80665], [1.0, 0.0, 0.0]);
        assert!(roll.abs() < 1e-3);
        assert!(pitch.abs() < 1e-3);
        assert!(yaw.abs() < 1e-3);
    }
}
