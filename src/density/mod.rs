//! IGSO(3) density and angular score.
//!
//! The isotropic Gaussian on SO(3) with variance t is the law of Brownian motion on
//! SO(3) at time t under the canonical inner product ⟨u, v⟩ = Trace(u vᵀ) / 2. Its
//! density with respect to the Haar volume form depends on a rotation only through its
//! angle ω and is approximated by the truncated series
//!
//! f(ω, t) = Σ_{l=0}^{L-1} (2l+1) e^{-l(l+1)t/2} sin((l+½)ω) / sin(ω/2)
//!
//! (Leach et al. 2022, eq. 5, with σ = √2 ε so that t = σ²).
//!
//! The log-density derivative is differentiated term by term in closed form; see
//! [`kernel`] for the evaluation itself and its cancellation guard.
//!
//! Every function in this module takes ω ∈ (0, π]. ω = 0 is a removable
//! singularity of the series and is rejected with
//! [`Igso3Error::DomainViolation`](crate::Igso3Error::DomainViolation) rather than
//! evaluated as 0/0.

use crate::error::{Igso3Error, Igso3Result};
use crate::manifold;
use nalgebra::Matrix3;
use std::f64::consts::PI;

pub mod kernel;

pub use kernel::{KernelSums, Representation};

/// Default series truncation level L.
pub const DEFAULT_TRUNCATION: usize = 2000;

/// Configuration of the truncated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesConfig {
    /// Number of series terms L; higher values matter mostly at small angles and small t
    pub truncation: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            truncation: DEFAULT_TRUNCATION,
        }
    }
}

impl SeriesConfig {
    /// Create a new series configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the truncation level L
    pub fn with_truncation(mut self, truncation: usize) -> Self {
        self.truncation = truncation;
        self
    }

    /// Check that L ≥ 1.
    pub fn validate(&self) -> Igso3Result<()> {
        if self.truncation < 1 {
            return Err(Igso3Error::invalid(format!(
                "truncation level must be at least 1, got {}",
                self.truncation
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_variance(t: f64) -> Igso3Result<()> {
    if !t.is_finite() || t <= 0.0 {
        return Err(Igso3Error::invalid(format!(
            "variance t must be finite and strictly positive, got {t}"
        )));
    }
    Ok(())
}

pub(crate) fn check_omega(omega: f64) -> Igso3Result<()> {
    if !omega.is_finite() || omega <= 0.0 || omega > PI {
        return Err(Igso3Error::domain(format!(
            "rotation angle must lie in (0, π], got {omega}"
        )));
    }
    Ok(())
}

/// Validated single-point kernel evaluation shared by the batch functions and the table.
pub(crate) fn kernel_at(omega: f64, t: f64, config: &SeriesConfig) -> Igso3Result<KernelSums> {
    check_omega(omega)?;
    let sums = kernel::evaluate(omega, t, config.truncation);
    if !sums.density.is_finite() || sums.density < 0.0 {
        return Err(Igso3Error::unstable(format!(
            "density f({omega}, {t}) evaluated to {}; raise min sigma or the truncation level",
            sums.density
        )));
    }
    Ok(sums)
}

/// Log-density derivative from already evaluated sums.
pub(crate) fn log_derivative_at(sums: &KernelSums, omega: f64, t: f64) -> Igso3Result<f64> {
    sums.log_derivative(omega).ok_or_else(|| {
        Igso3Error::unstable(format!(
            "log-density derivative undefined at omega = {omega}, t = {t} \
             (density {} is not strictly positive)",
            sums.density
        ))
    })
}

/// Truncated-series IGSO(3) density f(ω, t) for each ω.
///
/// # Arguments
/// * `omegas` - rotation angles in (0, π]
/// * `t` - variance, t = σ²
/// * `config` - series truncation
pub fn f_igso3(omegas: &[f64], t: f64, config: &SeriesConfig) -> Igso3Result<Vec<f64>> {
    config.validate()?;
    check_variance(t)?;
    omegas
        .iter()
        .map(|&omega| kernel_at(omega, t, config).map(|sums| sums.density))
        .collect()
}

/// d log f(ω, t) / dω for each ω.
///
/// Fails with `NumericalInstability` where the density is not strictly positive.
pub fn d_logf_d_omega(omegas: &[f64], t: f64, config: &SeriesConfig) -> Igso3Result<Vec<f64>> {
    config.validate()?;
    check_variance(t)?;
    omegas
        .iter()
        .map(|&omega| {
            let sums = kernel_at(omega, t, config)?;
            log_derivative_at(&sums, omega, t)
        })
        .collect()
}

/// Density with respect to the Haar volume form, evaluated at rotation matrices.
///
/// The identity rotation (ω = 0) is rejected with `DomainViolation`.
pub fn igso3_density(
    rotations: &[Matrix3<f64>],
    t: f64,
    config: &SeriesConfig,
) -> Igso3Result<Vec<f64>> {
    f_igso3(&manifold::omega(rotations), t, config)
}

/// Marginal density of the rotation angle, f(ω, t) · (1 - cos ω) / π.
///
/// The factor (1 - cos ω) / π is the Haar measure of the shell of rotations with
/// angle ω, so this integrates to one over (0, π].
pub fn igso3_density_angle(
    omegas: &[f64],
    t: f64,
    config: &SeriesConfig,
) -> Igso3Result<Vec<f64>> {
    let densities = f_igso3(omegas, t, config)?;
    Ok(omegas
        .iter()
        .zip(densities)
        .map(|(&omega, f)| marginal(f, omega))
        .collect())
}

#[inline]
pub(crate) fn marginal(density: f64, omega: f64) -> f64 {
    density * (1.0 - omega.cos()) / PI
}
