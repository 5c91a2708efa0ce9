//! WGS-84 geodetic transforms, all double precision (§4.1).
//!
//! `ecef2lla` follows Olson's closed-form solution (Olson, D.K., 1996),
//! ground-truthed against the reference implementation this filter was
//! ported from. `no_std` double-precision transcendentals come from
//! `libm`, the standard no-`std` counterpart to `std`'s `f64` methods.

use crate::constants::{A1, A2, A3, A4, A5, A6, ECEF2LLA_MIN_RADIUS_M, E2, SEMI_MAJOR_AXIS_M};

/// `lla2ecef`: geodetic `(lat rad, lon rad, alt m)` to ECEF `(x, y, z)` m.
pub fn lla2ecef(lla: (f64, f64, f64)) -> (f64, f64, f64) {
    let (lat, lon, alt) = lla;
    let sin_lat = libm::sin(lat);
    let cos_lat = libm::cos(lat);
    let cos_lon = libm::cos(lon);
    let sin_lon = libm::sin(lon);

    let rn = SEMI_MAJOR_AXIS_M / libm::sqrt(libm::fabs(1.0 - E2 * sin_lat * sin_lat));

    let x = (rn + alt) * cos_lat * cos_lon;
    let y = (rn + alt) * cos_lat * sin_lon;
    let z = (rn * (1.0 - E2) + alt) * sin_lat;
    (x, y, z)
}

/// `ecef2lla`: Olson's closed-form ECEF `(x, y, z)` m to geodetic
/// `(lat rad, lon rad, alt m)`. Returns `(0.0, 0.0, 0.0)` for inputs nearer
/// the Earth's center than [`ECEF2LLA_MIN_RADIUS_M`] — callers must treat
/// an all-zero result as "no conversion" (§7).
pub fn ecef2lla(ecef: (f64, f64, f64)) -> (f64, f64, f64) {
    let (x, y, z) = ecef;
    let zp = libm::fabs(z);
    let w2 = x * x + y * y;
    let w = libm::sqrt(w2);
    let z2 = z * z;
    let r2 = w2 + z2;
    let r = libm::sqrt(r2);

    if r < ECEF2LLA_MIN_RADIUS_M {
        return (0.0, 0.0, 0.0);
    }

    let lon = libm::atan2(y, x);

    let s2 = z2 / r2;
    let c2 = w2 / r2;
    let u = A2 / r;
    let v = A3 - A4 / r;

    let (mut lat, s, c);
    if c2 > 0.3 {
        let sv = (zp / r) * (1.0 + c2 * (A1 + u + s2 * v) / r);
        lat = libm::asin(sv);
        let ss = sv * sv;
        s = sv;
        c = libm::sqrt(1.0 - ss);
    } else {
        let cv = (w / r) * (1.0 - s2 * (A5 - u - c2 * v) / r);
        lat = libm::acos(cv);
        c = cv;
        s = libm::sqrt(1.0 - cv * cv);
    }

    let ss = s * s;
    let g = 1.0 - E2 * ss;
    let rg = SEMI_MAJOR_AXIS_M / libm::sqrt(g);
    let rf = A6 * rg;
    let uu = w - rg * c;
    let vv = zp - rf * s;
    let f = c * uu + s * vv;
    let m = c * vv - s * uu;
    let p = m / (rf / g + f);

    lat += p;
    let alt = f + m * p / 2.0;

    if z < 0.0 {
        lat = -lat;
    }

    (lat, lon, alt)
}

/// The `(N, E, D)`-row rotation matrix from ECEF to the NED frame local to
/// `lla_ref`, shared by `ecef2ned` and `ned2ecef` (§4.1).
fn ned_rotation(lla_ref: (f64, f64, f64)) -> [[f64; 3]; 3] {
    let (lat, lon, _alt) = lla_ref;
    let (sin_lat, cos_lat) = (libm::sin(lat), libm::cos(lat));
    let (sin_lon, cos_lon) = (libm::sin(lon), libm::cos(lon));
    [
        [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat],
        [-sin_lon, cos_lon, 0.0],
        [-cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat],
    ]
}

/// `ecef2ned`: rotate an already-differenced ECEF vector into the NED
/// frame local to `lla_ref`.
pub fn ecef2ned(ecef: (f64, f64, f64), lla_ref: (f64, f64, f64)) -> (f64, f64, f64) {
    let r = ned_rotation(lla_ref);
    let (x, y, z) = ecef;
    (
        r[0][0] * x + r[0][1] * y + r[0][2] * z,
        r[1][0] * x + r[1][1] * y + r[1][2] * z,
        r[2][0] * x + r[2][1] * y + r[2][2] * z,
    )
}

/// `ned2ecef`: rotate a NED vector back into ECEF using the transpose of
/// the same rotation matrix.
pub fn ned2ecef(ned: (f64, f64, f64), lla_ref: (f64, f64, f64)) -> (f64, f64, f64) {
    let r = ned_rotation(lla_ref);
    let (n, e, d) = ned;
    (
        r[0][0] * n + r[1][0] * e + r[2][0] * d,
        r[0][1] * n + r[1][1] * e + r[2][1] * d,
        r[0][2] * n + r[1][2] * e + r[2][2] * d,
    )
}

/// `lla2ned`: `loc`'s position relative to `ref`, expressed in the NED
/// frame local to `ref`.
pub fn lla2ned(loc: (f64, f64, f64), reference: (f64, f64, f64)) -> (f64, f64, f64) {
    let ecef_loc = lla2ecef(loc);
    let ecef_ref = lla2ecef(reference);
    let diff = (
        ecef_loc.0 - ecef_ref.0,
        ecef_loc.1 - ecef_ref.1,
        ecef_loc.2 - ecef_ref.2,
    );
    ecef2ned(diff, reference)
}

/// `ned2lla`: the inverse of `lla2ned` — a NED offset from `reference`
/// back to absolute geodetic coordinates.
pub fn ned2lla(ned: (f64, f64, f64), reference: (f64, f64, f64)) -> (f64, f64, f64) {
    let ecef = ned2ecef(ned, reference);
    let ecef_ref = lla2ecef(reference);
    ecef2lla((ecef.0 + ecef_ref.0, ecef.1 + ecef_ref.1, ecef.2 + ecef_ref.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn lla2ecef_equator_prime_meridian() {
        let (x, y, z) = lla2ecef((0.0, 0.0, 0.0));
        assert!((x - SEMI_MAJOR_AXIS_M).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
        assert!(z.abs() < 1e-6);
    }

    #[test]
    fn lla2ecef_north_pole() {
        let (x, y, z) = lla2ecef((PI / 2.0, 0.0, 0.0));
        let expect_z = SEMI_MAJOR_AXIS_M * (1.0 - E2) / libm::sqrt(1.0 - E2);
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);
        assert!((z - expect_z).abs() < 1e-6);
    }

    #[test]
    fn ecef2lla_degenerate_input_is_zero() {
        let lla = ecef2lla((10.0, 10.0, 10.0));
        assert_eq!(lla, (0.0, 0.0, 0.0));
    }

    #[test]
    fn lla_ecef_roundtrip() {
        let cases = [
            (0.0, 0.0, 0.0),
            (0.7, -1.2, 500.0),
            (-0.5, 2.5, -100.0),
            (1.3, 0.1, 9000.0),
            (-1.3, -3.0, 50000.0),
        ];
        for lla in cases {
            let ecef = lla2ecef(lla);
            let back = ecef2lla(ecef);
            assert!((back.0 - lla.0).abs() < 1e-9, "lat {:?} -> {:?}", lla, back);
            assert!((back.1 - lla.1).abs() < 1e-9, "lon {:?} -> {:?}", lla, back);
            assert!((back.2 - lla.2).abs() < 1e-3, "alt {:?} -> {:?}", lla, back);
        }
    }

    #[test]
    fn ned_lla_roundtrip() {
        let reference = (0.7, -1.2, 200.0);
        let loc = (0.7005, -1.1995, 220.0);
        let ned = lla2ned(loc, reference);
        let back = ned2lla(ned, reference);
        assert!((back.0 - loc.0).abs() < 1e-9);
        assert!((back.1 - loc.1).abs() < 1e-9);
        assert!((back.2 - loc.2).abs() < 1e-3);
    }

    #[test]
    fn ned_of_self_is_zero() {
        let reference = (0.5, 1.0, 100.0);
        let ned = lla2ned(reference, reference);
        assert!(ned.0.abs() < 1e-6);
        assert!(ned.1.abs() < 1e-6);
        assert!(ned.2.abs() < 1e-6);
    }
}
