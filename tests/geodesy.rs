//! Literal geodesy checks (§8 scenario 4).

use ekf15_nav::geodetic::lla2ecef;

const SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;
const E2: f64 = 6.694_379_990_141_316e-3;

#[test]
fn equator_prime_meridian_is_the_semi_major_axis() {
    let (x, y, z) = lla2ecef((0.0, 0.0, 0.0));
    assert!((x - SEMI_MAJOR_AXIS_M).abs() < 1e-6);
    assert!(y.abs() < 1e-6);
    assert!(z.abs() < 1e-6);
}

#[test]
fn north_pole_z_matches_polar_radius() {
    let (x, y, z) = lla2ecef((core::f64::consts::FRAC_PI_2, 0.0, 0.0));
    let expect_z = SEMI_MAJOR_AXIS_M * (1.0 - E2) / libm::sqrt(1.0 - E2);
    assert!(x.abs() < 1e-6);
    assert!(y.abs() < 1e-6);
    assert!((z - expect_z).abs() < 1e-6);
}
