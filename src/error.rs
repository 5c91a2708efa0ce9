//! Error and status reporting (§7, §10.2).
//!
//! Errors are reported, not thrown: this is embedded code with no exception
//! discipline and no heap, so both enums are small, `Copy`, and carry no
//! allocated message — callers match on the variant, the same shape as a
//! small `Result<_, embassy_stm32::spi::Error>`-returning driver method.

/// Returned by [`crate::ekf::Ekf::configure`]. A configuration error is
/// fatal to the caller: the filter refuses to run until the parameter is
/// corrected and `configure` is called again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum ConfigError {
    /// A correlation time (`accel_tau` or `gyro_tau`) was not positive.
    NonPositiveTau,
    /// A standard deviation parameter was negative.
    NegativeSigma,
}

/// Returned alongside the [`crate::ekf::state::Ins`] from
/// [`crate::ekf::Ekf::measurement_update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum UpdateStatus {
    /// The GNSS fix was fused; state and covariance were corrected.
    Applied,
    /// The innovation covariance `S` was singular to working precision; the
    /// update was skipped and `P`/state are unchanged (§4.5, §7).
    Rejected,
}
