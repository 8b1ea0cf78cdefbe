//! Matrix-valued IGSO(3) score ∇_R log f(R; I, t).
//!
//! The density depends on R only through ω, so its Riemannian gradient points along
//! the geodesic direction R · log(R) / ω (a unit vector under ⟨u, v⟩ = Trace(u vᵀ) / 2)
//! and has magnitude d log f / dω.

use crate::density::{self, SeriesConfig};
use crate::error::{Igso3Error, Igso3Result};
use crate::manifold::SO3;
use nalgebra::Matrix3;

/// Score of each rotation, expressed as a matrix in the tangent space at R.
///
/// score = (R · log(R) / ω) · d log f(ω, t) / dω
///
/// The identity (ω = 0) has no geodesic direction and is rejected with
/// `DomainViolation`.
pub fn igso3_score(
    rotations: &[Matrix3<f64>],
    t: f64,
    config: &SeriesConfig,
) -> Igso3Result<Vec<Matrix3<f64>>> {
    config.validate()?;
    density::check_variance(t)?;

    rotations
        .iter()
        .map(|rotation| {
            let so3 = SO3::from_matrix(rotation);
            let omega = so3.omega();
            if omega <= 0.0 {
                return Err(Igso3Error::domain(
                    "score is undefined at the identity rotation (omega = 0)",
                ));
            }

            let sums = density::kernel_at(omega, t, config)?;
            let radial = density::log_derivative_at(&sums, omega, t)?;
            let unit_vector = rotation * so3.log_matrix() / omega;
            Ok(unit_vector * radial)
        })
        .collect()
}
