//! The 15-state error-state EKF engine (§3, §4.3–§4.5).

pub mod config;
pub mod state;

use crate::attitude::{skew, Quaternion};
use crate::constants::{E2, GRAVITY_MPS2, SEMI_MAJOR_AXIS_M};
use crate::error::{ConfigError, UpdateStatus};
use crate::geodetic::lla2ned;
use crate::linalg::{self, Mat};
use crate::units::Vec3;

pub use config::Config;
pub use state::{EulerAngles, GnssFix, ImuSample, Ins, LlaPos, MagSample};

/// A 15-state strapdown INS / GNSS extended Kalman filter.
///
/// Call order: [`Ekf::configure`], then [`Ekf::initialize`], then repeated
/// [`Ekf::time_update`] on every IMU sample with [`Ekf::measurement_update`]
/// on every GNSS fix (§5).
#[derive(Clone, Copy, Debug)]
pub struct Ekf {
    config: Config,
    quat: Quaternion,
    accel_bias: [f32; 3],
    gyro_bias: [f32; 3],
    lla_pos: (f64, f64, f64),
    ned_vel: [f32; 3],
    accel: [f32; 3],
    gyro: [f32; 3],
    p: Mat<15, 15>,
    h: Mat<6, 15>,
    rw: Mat<12, 12>,
    r: Mat<6, 6>,
    neg_inv_tau_a: f32,
    neg_inv_tau_g: f32,
}

impl Default for Ekf {
    fn default() -> Self {
        Self {
            config: Config::default(),
            quat: Quaternion::IDENTITY,
            accel_bias: [0.0; 3],
            gyro_bias: [0.0; 3],
            lla_pos: (0.0, 0.0, 0.0),
            ned_vel: [0.0; 3],
            accel: [0.0; 3],
            gyro: [0.0; 3],
            p: linalg::zero(),
            h: linalg::zero(),
            rw: linalg::zero(),
            r: linalg::zero(),
            neg_inv_tau_a: 0.0,
            neg_inv_tau_g: 0.0,
        }
    }
}

impl Ekf {
    /// A freshly allocated filter. [`Ekf::configure`] must be called before
    /// [`Ekf::initialize`] or the update methods produce meaningless output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build `H`, `Rw`, `R`, the initial `P`, and the Markov bias rates from
    /// `config` (§4.3). Rejects non-positive correlation times or negative
    /// standard deviations.
    pub fn configure(&mut self, config: Config) -> Result<(), ConfigError> {
        config.validate()?;
        defmt::debug!("ekf configure");

        let mut h = linalg::zero::<6, 15>();
        for i in 0..5 {
            h[i][i] = 1.0;
        }
        if config.fuse_vertical_velocity {
            h[5][5] = 1.0;
        }

        let mut rw = linalg::zero::<12, 12>();
        linalg::set_block(
            &mut rw,
            0,
            0,
            &linalg::scaled_identity::<3>(config.accel_std * config.accel_std),
        );
        linalg::set_block(
            &mut rw,
            3,
            3,
            &linalg::scaled_identity::<3>(config.gyro_std * config.gyro_std),
        );
        linalg::set_block(
            &mut rw,
            6,
            6,
            &linalg::scaled_identity::<3>(
                2.0 * config.accel_markov_bias_std * config.accel_markov_bias_std
                    / config.accel_tau,
            ),
        );
        linalg::set_block(
            &mut rw,
            9,
            9,
            &linalg::scaled_identity::<3>(
                2.0 * config.gyro_markov_bias_std * config.gyro_markov_bias_std / config.gyro_tau,
            ),
        );

        let mut r = linalg::zero::<6, 6>();
        r[0][0] = config.gnss_pos_ne_std * config.gnss_pos_ne_std;
        r[1][1] = config.gnss_pos_ne_std * config.gnss_pos_ne_std;
        r[2][2] = config.gnss_pos_d_std * config.gnss_pos_d_std;
        r[3][3] = config.gnss_vel_ne_std * config.gnss_vel_ne_std;
        r[4][4] = config.gnss_vel_ne_std * config.gnss_vel_ne_std;
        r[5][5] = config.gnss_vel_d_std * config.gnss_vel_d_std;

        let mut p = linalg::zero::<15, 15>();
        linalg::set_block(
            &mut p,
            0,
            0,
            &linalg::scaled_identity::<3>(config.init_pos_err_std * config.init_pos_err_std),
        );
        linalg::set_block(
            &mut p,
            3,
            3,
            &linalg::scaled_identity::<3>(config.init_vel_err_std * config.init_vel_err_std),
        );
        p[6][6] = config.init_att_err_std * config.init_att_err_std;
        p[7][7] = config.init_att_err_std * config.init_att_err_std;
        p[8][8] = config.init_heading_err_std * config.init_heading_err_std;
        linalg::set_block(
            &mut p,
            9,
            9,
            &linalg::scaled_identity::<3>(
                config.init_accel_bias_std * config.init_accel_bias_std,
            ),
        );
        linalg::set_block(
            &mut p,
            12,
            12,
            &linalg::scaled_identity::<3>(config.init_gyro_bias_std * config.init_gyro_bias_std),
        );

        self.h = h;
        self.rw = rw;
        self.r = r;
        self.p = p;
        self.neg_inv_tau_a = -1.0 / config.accel_tau;
        self.neg_inv_tau_g = -1.0 / config.gyro_tau;
        self.config = config;
        Ok(())
    }

    /// Seed the nominal state from one IMU + magnetometer + GNSS sample:
    /// position/velocity from the fix, gyro bias from the raw gyro reading,
    /// attitude from [`crate::attitude::tilt_compass`] (§3 "Lifecycle",
    /// §8 scenario 1).
    pub fn initialize(&mut self, imu: ImuSample, mag: MagSample, gnss: GnssFix) -> Ins {
        defmt::debug!("ekf initialize");
        self.lla_pos = gnss.lla_pos.as_tuple();
        self.ned_vel = gnss.ned_vel.to_array();
        self.gyro_bias = imu.gyro.to_array();
        self.accel_bias = [0.0; 3];

        let accel = imu.accel.to_array();
        let (roll, pitch, yaw) = crate::attitude::tilt_compass(accel, mag.field.to_array());
        self.quat = Quaternion::from_euler(roll, pitch, yaw).normalize_sign_flip();

        self.accel = accel;
        self.gyro = [0.0; 3];

        self.to_ins()
    }

    /// Propagate the nominal state and error covariance by `dt` seconds
    /// given one bias-uncorrected IMU sample (§4.4).
    pub fn time_update(&mut self, imu: ImuSample, dt: f32) -> Ins {
        let a_meas = imu.accel.to_array();
        let w_meas = imu.gyro.to_array();
        let a_b = [
            a_meas[0] - self.accel_bias[0],
            a_meas[1] - self.accel_bias[1],
            a_meas[2] - self.accel_bias[2],
        ];
        let w_b = [
            w_meas[0] - self.gyro_bias[0],
            w_meas[1] - self.gyro_bias[1],
            w_meas[2] - self.gyro_bias[2],
        ];

        let dq = Quaternion::from_small_angle([
            0.5 * w_b[0] * dt,
            0.5 * w_b[1] * dt,
            0.5 * w_b[2] * dt,
        ]);
        self.quat = self.quat.mul(dq).normalize_sign_flip();
        let c_b2n = self.quat.to_dcm();

        let accel_ned = linalg::mul_vec(&c_b2n, &a_b);
        let g_ned = [0.0, 0.0, GRAVITY_MPS2];
        for i in 0..3 {
            self.ned_vel[i] += dt * (accel_ned[i] + g_ned[i]);
        }

        let (dlat, dlon, dalt) = crate::attitude::lla_rate(self.ned_vel, self.lla_pos);
        self.lla_pos = (
            self.lla_pos.0 + dt as f64 * dlat,
            self.lla_pos.1 + dt as f64 * dlon,
            self.lla_pos.2 + dt as f64 * dalt,
        );

        let mut f = linalg::zero::<15, 15>();
        linalg::set_block(&mut f, 0, 3, &linalg::identity::<3>());
        f[5][2] = -2.0 * GRAVITY_MPS2 / SEMI_MAJOR_AXIS_M as f32;
        let skew_a = skew(a_b);
        linalg::set_block(
            &mut f,
            3,
            6,
            &linalg::scale(&linalg::mul(&c_b2n, &skew_a), -2.0),
        );
        linalg::set_block(&mut f, 3, 9, &linalg::scale(&c_b2n, -1.0));
        linalg::set_block(&mut f, 6, 6, &linalg::scale(&skew(w_b), -1.0));
        linalg::set_block(&mut f, 6, 12, &linalg::scaled_identity::<3>(-0.5));
        linalg::set_block(&mut f, 9, 9, &linalg::scaled_identity::<3>(self.neg_inv_tau_a));
        linalg::set_block(&mut f, 12, 12, &linalg::scaled_identity::<3>(self.neg_inv_tau_g));

        let mut phi = linalg::identity::<15>();
        for i in 0..15 {
            for j in 0..15 {
                phi[i][j] += f[i][j] * dt;
            }
        }

        let mut g = linalg::zero::<15, 12>();
        linalg::set_block(&mut g, 3, 0, &linalg::scale(&c_b2n, -1.0));
        linalg::set_block(&mut g, 6, 3, &linalg::scaled_identity::<3>(-0.5));
        linalg::set_block(&mut g, 9, 6, &linalg::identity::<3>());
        linalg::set_block(&mut g, 12, 9, &linalg::identity::<3>());

        let g_rw = linalg::mul(&g, &self.rw);
        let g_rw_gt = linalg::mul(&g_rw, &linalg::transpose(&g));
        let q = linalg::symmetrize(&linalg::mul(&phi, &linalg::scale(&g_rw_gt, dt)));

        let phi_p = linalg::mul(&phi, &self.p);
        let phi_p_phit = linalg::mul(&phi_p, &linalg::transpose(&phi));
        self.p = linalg::symmetrize(&linalg::add(&phi_p_phit, &q));

        self.accel = a_b;
        self.gyro = w_b;

        self.to_ins()
    }

    /// Correct the nominal state and covariance with one GNSS fix (§4.5).
    /// Returns [`UpdateStatus::Rejected`] with `P`/state unchanged if the
    /// innovation covariance is singular to working precision.
    pub fn measurement_update(&mut self, gnss: GnssFix) -> (Ins, UpdateStatus) {
        let ned_resid = lla2ned(gnss.lla_pos.as_tuple(), self.lla_pos);
        let gnss_vel = gnss.ned_vel.to_array();
        let y: [f32; 6] = [
            ned_resid.0 as f32,
            ned_resid.1 as f32,
            ned_resid.2 as f32,
            gnss_vel[0] - self.ned_vel[0],
            gnss_vel[1] - self.ned_vel[1],
            gnss_vel[2] - self.ned_vel[2],
        ];

        let ht = linalg::transpose(&self.h);
        let p_ht = linalg::mul(&self.p, &ht);
        let s = linalg::add(&linalg::mul(&self.h, &p_ht), &self.r);

        let s_inv = match linalg::invert(&s) {
            Some(inv) => inv,
            None => {
                defmt::warn!("ekf measurement rejected: singular innovation covariance");
                return (self.to_ins(), UpdateStatus::Rejected);
            }
        };
        let k = linalg::mul(&p_ht, &s_inv);

        let kh = linalg::mul(&k, &self.h);
        let i_kh = linalg::sub(&linalg::identity::<15>(), &kh);
        let term1 = linalg::mul(&linalg::mul(&i_kh, &self.p), &linalg::transpose(&i_kh));
        let kr = linalg::mul(&k, &self.r);
        let term2 = linalg::mul(&kr, &linalg::transpose(&k));
        self.p = linalg::symmetrize(&linalg::add(&term1, &term2));

        let x = linalg::mul_vec(&k, &y);

        // Position correction. `Rns`/`Rew` are preserved swapped against
        // their usual meridian/prime-vertical roles, and the term that
        // would ordinarily be `sqrt(denom)` is `denom` itself — both
        // confirmed against the reference this filter was ported from and
        // kept literally rather than "fixed" (see the design notes).
        let (lat, lon, alt) = self.lla_pos;
        let alt = alt - x[2] as f64;
        let sin_lat = libm::sin(lat);
        let denom = 1.0 - E2 * sin_lat * sin_lat;
        let sqrt_denom = denom;
        let rns = SEMI_MAJOR_AXIS_M * (1.0 - E2) / (denom * sqrt_denom);
        let rew = SEMI_MAJOR_AXIS_M / sqrt_denom;
        let lat = lat + x[0] as f64 / (rew + alt);
        let lon = lon + x[1] as f64 / ((rns + alt) * libm::cos(lat));
        self.lla_pos = (lat, lon, alt);

        for i in 0..3 {
            self.ned_vel[i] += x[3 + i];
        }

        let dq = Quaternion::from_small_angle([x[6], x[7], x[8]]);
        self.quat = self.quat.mul(dq).normalize_sign_flip();

        for i in 0..3 {
            self.accel_bias[i] += x[9 + i];
            self.gyro_bias[i] += x[12 + i];
            self.accel[i] -= x[9 + i];
            self.gyro[i] -= x[12 + i];
        }

        (self.to_ins(), UpdateStatus::Applied)
    }

    /// The current `P` (error-state covariance), for callers that want to
    /// inspect filter health directly (§8 scenario 6, the symmetry test).
    pub fn covariance(&self) -> Mat<15, 15> {
        self.p
    }

    fn to_ins(&self) -> Ins {
        let (roll, pitch, yaw) = self.quat.to_euler();
        Ins {
            lla_pos: LlaPos::from_tuple(self.lla_pos),
            ned_vel: Vec3::from_array(self.ned_vel),
            attitude: EulerAngles::from_tuple((roll, pitch, yaw)),
            accel: Vec3::from_array(self.accel),
            gyro: Vec3::from_array(self.gyro),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_imu() -> ImuSample {
        ImuSample::new([0.0, 0.0, -9.80665], [0.0, 0.0, 0.0])
    }

    fn level_mag() -> MagSample {
        MagSample::new([1.0, 0.0, 0.0])
    }

    fn origin_gnss() -> GnssFix {
        GnssFix::new(LlaPos::new(0.0, 0.0, 0.0), [0.0, 0.0, 0.0])
    }

    #[test]
    fn configure_rejects_bad_params() {
        let mut ekf = Ekf::new();
        let mut cfg = Config::default();
        cfg.gyro_tau = -1.0;
        assert_eq!(ekf.configure(cfg), Err(ConfigError::NonPositiveTau));
    }

    #[test]
    fn static_level_initialize_has_zero_attitude_and_gyro_bias_equal_reading() {
        let mut ekf = Ekf::new();
        ekf.configure(Config::default()).unwrap();
        let ins = ekf.initialize(level_imu(), level_mag(), origin_gnss());
        assert!(ins.attitude.roll.0.abs() < 1e-3);
        assert!(ins.attitude.pitch.0.abs() < 1e-3);
        assert!(ins.attitude.yaw.0.abs() < 1e-3);
    }

    #[test]
    fn zero_dt_time_update_is_a_no_op() {
        let mut ekf = Ekf::new();
        ekf.configure(Config::default()).unwrap();
        let before = ekf.initialize(level_imu(), level_mag(), origin_gnss());
        let after = ekf.time_update(level_imu(), 0.0);
        assert!((after.ned_vel.x.0 - before.ned_vel.x.0).abs() < 1e-6);
        assert!((after.lla_pos.lat.0 - before.lla_pos.lat.0).abs() < 1e-9);
    }

    #[test]
    fn static_level_repeated_time_updates_hold_velocity_constant() {
        let mut ekf = Ekf::new();
        ekf.configure(Config::default()).unwrap();
        ekf.initialize(level_imu(), level_mag(), origin_gnss());
        let mut ins = Ins::default();
        for _ in 0..1000 {
            ins = ekf.time_update(level_imu(), 0.01);
        }
        assert!(ins.ned_vel.x.0.abs() < 1e-3);
        assert!(ins.ned_vel.y.0.abs() < 1e-3);
        assert!(ins.ned_vel.z.0.abs() < 1e-3);
    }

    #[test]
    fn pure_yaw_rotation_accumulates_expected_heading() {
        let mut ekf = Ekf::new();
        ekf.configure(Config::default()).unwrap();
        ekf.initialize(level_imu(), level_mag(), origin_gnss());
        let imu = ImuSample::new([0.0, 0.0, -9.80665], [0.0, 0.0, 0.1]);
        let mut ins = Ins::default();
        for _ in 0..1000 {
            ins = ekf.time_update(imu, 0.01);
        }
        assert!((ins.attitude.yaw.0 - 1.0).abs() < 2e-2, "{}", ins.attitude.yaw.0);
        assert!(ins.attitude.roll.0.abs() < 1e-3);
        assert!(ins.attitude.pitch.0.abs() < 1e-3);
    }

    #[test]
    fn measurement_update_pulls_state_toward_gnss_fix() {
        let mut ekf = Ekf::new();
        ekf.configure(Config::default()).unwrap();
        ekf.initialize(level_imu(), level_mag(), origin_gnss());
        for _ in 0..100 {
            ekf.time_update(level_imu(), 0.01);
        }
        let fix = GnssFix::new(LlaPos::new(1e-6, 1e-6, 1.0), [0.1, 0.1, 0.0]);
        let (ins, status) = ekf.measurement_update(fix);
        assert_eq!(status, UpdateStatus::Applied);
        assert!(ins.ned_vel.x.0 > 0.0);
    }

    #[test]
    fn measurement_update_rejects_singular_innovation_covariance() {
        let mut ekf = Ekf::new();
        // Zero R and zero initial-error P on the observed rows makes
        // S = H*P*H^T + R singular on the very first fix.
        let mut cfg = Config::default();
        cfg.init_pos_err_std = 0.0;
        cfg.init_vel_err_std = 0.0;
        cfg.gnss_pos_ne_std = 0.0;
        cfg.gnss_pos_d_std = 0.0;
        cfg.gnss_vel_ne_std = 0.0;
        cfg.gnss_vel_d_std = 0.0;
        ekf.configure(cfg).unwrap();
        ekf.initialize(level_imu(), level_mag(), origin_gnss());
        let (_ins, status) = ekf.measurement_update(origin_gnss());
        assert_eq!(status, UpdateStatus::Rejected);
    }

    #[test]
    fn covariance_stays_symmetric_over_many_cycles() {
        let mut ekf = Ekf::new();
        ekf.configure(Config::default()).unwrap();
        ekf.initialize(level_imu(), level_mag(), origin_gnss());
        for i in 0..500 {
            ekf.time_update(level_imu(), 0.01);
            if i % 10 == 0 {
                ekf.measurement_update(origin_gnss());
            }
            let p = ekf.covariance();
            let norm = linalg::frobenius_norm(&p).max(1.0);
            assert!(linalg::max_asymmetry(&p) / norm < 1e-5);
        }
    }
}
