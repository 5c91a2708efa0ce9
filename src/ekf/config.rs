//! Configurable filter parameters and their defaults (§3, §10.3).

use crate::error::ConfigError;

/// Sensor models, GNSS noise, and initial-covariance parameters, set
/// before calling [`crate::ekf::Ekf::configure`]. All SI units, `f32`.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct Config {
    /// Accelerometer white-noise standard deviation, m/s^2.
    pub accel_std: f32,
    /// Accelerometer Markov bias standard deviation, m/s^2.
    pub accel_markov_bias_std: f32,
    /// Accelerometer Markov bias correlation time, s.
    pub accel_tau: f32,
    /// Gyro white-noise standard deviation, rad/s.
    pub gyro_std: f32,
    /// Gyro Markov bias standard deviation, rad/s.
    pub gyro_markov_bias_std: f32,
    /// Gyro Markov bias correlation time, s.
    pub gyro_tau: f32,
    /// GNSS horizontal (N/E) position standard deviation, m.
    pub gnss_pos_ne_std: f32,
    /// GNSS vertical (D) position standard deviation, m.
    pub gnss_pos_d_std: f32,
    /// GNSS horizontal (N/E) velocity standard deviation, m/s.
    pub gnss_vel_ne_std: f32,
    /// GNSS vertical (D) velocity standard deviation, m/s.
    pub gnss_vel_d_std: f32,
    /// Initial position-error standard deviation, m.
    pub init_pos_err_std: f32,
    /// Initial velocity-error standard deviation, m/s.
    pub init_vel_err_std: f32,
    /// Initial roll/pitch error standard deviation, rad.
    pub init_att_err_std: f32,
    /// Initial heading error standard deviation, rad.
    pub init_heading_err_std: f32,
    /// Initial accel bias standard deviation, m/s^2.
    pub init_accel_bias_std: f32,
    /// Initial gyro bias standard deviation, rad/s.
    pub init_gyro_bias_std: f32,
    /// Whether the observation matrix fuses GNSS vertical velocity
    /// (`H[5,5] = 1`) or leaves the historical decoupling in place
    /// (`H[5,5] = 0`, the default). See the §9 open-question resolution.
    pub fuse_vertical_velocity: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accel_std: 0.05,
            accel_markov_bias_std: 0.01,
            accel_tau: 100.0,
            gyro_std: 0.00175,
            gyro_markov_bias_std: 0.00025,
            gyro_tau: 50.0,
            gnss_pos_ne_std: 3.0,
            gnss_pos_d_std: 6.0,
            gnss_vel_ne_std: 0.5,
            gnss_vel_d_std: 1.0,
            init_pos_err_std: 10.0,
            init_vel_err_std: 1.0,
            init_att_err_std: 0.349_06,
            init_heading_err_std: core::f32::consts::PI,
            init_accel_bias_std: 0.981,
            init_gyro_bias_std: 0.017_45,
            fuse_vertical_velocity: false,
        }
    }
}

impl Config {
    /// Validate before [`crate::ekf::Ekf::configure`] builds the noise and
    /// covariance matrices: every correlation time must be positive, every
    /// standard deviation non-negative (§7, "Configuration error").
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.accel_tau <= 0.0 || self.gyro_tau <= 0.0 {
            return Err(ConfigError::NonPositiveTau);
        }
        let sigmas = [
            self.accel_std,
            self.accel_markov_bias_std,
            self.gyro_std,
            self.gyro_markov_bias_std,
            self.gnss_pos_ne_std,
            self.gnss_pos_d_std,
            self.gnss_vel_ne_std,
            self.gnss_vel_d_std,
            self.init_pos_err_std,
            self.init_vel_err_std,
            self.init_att_err_std,
            self.init_heading_err_std,
            self.init_accel_bias_std,
            self.init_gyro_bias_std,
        ];
        if sigmas.iter().any(|&s| s < 0.0) {
            return Err(ConfigError::NegativeSigma);
        }
        Ok(())
    }
}
