//! SO(3) - Special Orthogonal Group in 3D
//!
//! This module implements the Special Orthogonal group SO(3), which represents
//! rotations in 3D space.
//!
//! SO(3) elements are represented using nalgebra's UnitQuaternion internally.
//! SO(3) tangent elements are represented as axis-angle vectors in R³,
//! where the direction gives the axis of rotation and the magnitude gives the angle.
//!
//! Angles are measured with the canonical bi-invariant inner product on so(3),
//! ⟨u, v⟩ = Trace(u vᵀ) / 2, under which ‖[θ]ₓ‖ = ‖θ‖. This is the metric in
//! which Brownian motion on SO(3) at time t has the IGSO(3) law with variance t.

use nalgebra::{Matrix3, Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};
use rand::Rng;
use std::f64::consts::{PI, SQRT_2};

/// SO(3) group element representing rotations in 3D.
///
/// Internally represented using nalgebra's UnitQuaternion<f64>.
#[derive(Clone, Debug, PartialEq)]
pub struct SO3 {
    /// Internal representation as a unit quaternion
    quaternion: UnitQuaternion<f64>,
}

/// SO(3) tangent space element representing elements in the Lie algebra so(3).
///
/// Internally represented as axis-angle vectors in R³ where:
/// - Direction: axis of rotation (unit vector)
/// - Magnitude: angle of rotation (radians)
#[derive(Clone, Debug, PartialEq)]
pub struct SO3Tangent {
    /// Internal data: axis-angle vector [θx, θy, θz]
    data: Vector3<f64>,
}

impl SO3 {
    /// Create a new SO(3) element from a unit quaternion.
    pub fn new(quaternion: UnitQuaternion<f64>) -> Self {
        SO3 { quaternion }
    }

    /// Identity rotation.
    pub fn identity() -> Self {
        SO3 {
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// Create SO(3) from a rotation matrix.
    ///
    /// The matrix is expected to be (approximately) orthonormal with determinant +1.
    /// This is not checked; the resulting quaternion is renormalized so small
    /// orthogonality drift in the input does not leak into later operations.
    pub fn from_matrix(matrix: &Matrix3<f64>) -> Self {
        let rotation = Rotation3::from_matrix_unchecked(*matrix);
        let q = UnitQuaternion::from_rotation_matrix(&rotation);
        SO3 {
            quaternion: UnitQuaternion::from_quaternion(q.into_inner()),
        }
    }

    /// Create SO(3) from axis-angle representation.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        let unit_axis = Unit::new_normalize(*axis);
        SO3::new(UnitQuaternion::from_axis_angle(&unit_axis, angle))
    }

    /// Create SO(3) from scaled axis (axis-angle vector).
    pub fn from_scaled_axis(axis_angle: Vector3<f64>) -> Self {
        SO3Tangent::new(axis_angle).exp()
    }

    /// Get the quaternion representation.
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.quaternion
    }

    /// Get the rotation matrix (3x3).
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.quaternion.to_rotation_matrix().into_inner()
    }

    /// Group composition R₁ ∘ R₂.
    pub fn compose(&self, other: &SO3) -> SO3 {
        SO3 {
            quaternion: self.quaternion * other.quaternion,
        }
    }

    /// Group inverse R⁻¹ = Rᵀ.
    pub fn inverse(&self) -> SO3 {
        SO3 {
            quaternion: self.quaternion.inverse(),
        }
    }

    /// Logarithmic map to the axis-angle vector, with angle in [0, π].
    ///
    /// # Notes
    /// θu = Log(q) = (2 / ‖v‖) · v · atan2(‖v‖, w)
    ///
    /// The quaternion is flipped to the w ≥ 0 hemisphere first so that the
    /// returned angle never exceeds π.
    pub fn log(&self) -> SO3Tangent {
        let q = self.quaternion.quaternion();
        let sin_angle_squared = q.i * q.i + q.j * q.j + q.k * q.k;

        let log_coeff = if sin_angle_squared > f64::EPSILON {
            let sin_angle = sin_angle_squared.sqrt();
            let cos_angle = q.w;

            // q and -q encode the same rotation; pick the one with w >= 0
            let two_angle = 2.0
                * if cos_angle < 0.0 {
                    f64::atan2(-sin_angle, -cos_angle)
                } else {
                    f64::atan2(sin_angle, cos_angle)
                };

            two_angle / sin_angle
        } else {
            // Small-angle approximation
            2.0 * q.w.signum()
        };

        SO3Tangent::new(Vector3::new(
            q.i * log_coeff,
            q.j * log_coeff,
            q.k * log_coeff,
        ))
    }

    /// Matrix logarithm: the skew-symmetric element of so(3), `hat(Log(R))`.
    pub fn log_matrix(&self) -> Matrix3<f64> {
        self.log().hat()
    }

    /// Geodesic rotation angle ω ∈ [0, π].
    ///
    /// Computed as ‖log(R)‖_F / √2, the norm of the matrix logarithm under the
    /// canonical inner product ⟨u, v⟩ = Trace(u vᵀ) / 2.
    pub fn omega(&self) -> f64 {
        (self.log_matrix().norm() / SQRT_2).min(PI)
    }

    /// Uniformly (Haar) distributed random rotation drawn from `rng`.
    ///
    /// Uses Shoemake's subgroup algorithm on three uniform variates.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let u1: f64 = rng.random();
        let u2: f64 = rng.random();
        let u3: f64 = rng.random();

        let a = (1.0 - u1).sqrt();
        let b = u1.sqrt();
        let (s2, c2) = (2.0 * PI * u2).sin_cos();
        let (s3, c3) = (2.0 * PI * u3).sin_cos();

        SO3 {
            quaternion: UnitQuaternion::from_quaternion(Quaternion::new(
                b * c3,
                a * s2,
                a * c2,
                b * s3,
            )),
        }
    }

    /// Check that the underlying quaternion is normalized.
    pub fn is_valid(&self, tolerance: f64) -> bool {
        (self.quaternion.quaternion().norm() - 1.0).abs() < tolerance
    }
}

impl SO3Tangent {
    /// Create a new SO3Tangent from axis-angle vector.
    ///
    /// # Arguments
    /// * `axis_angle` - Axis-angle vector [θx, θy, θz]
    pub fn new(axis_angle: Vector3<f64>) -> Self {
        SO3Tangent { data: axis_angle }
    }

    /// Zero tangent vector.
    pub fn zero() -> Self {
        Self::new(Vector3::zeros())
    }

    /// Recover the axis-angle vector from a skew-symmetric matrix (vee map).
    ///
    /// Only the skew-symmetric part of `matrix` contributes.
    pub fn vee(matrix: &Matrix3<f64>) -> Self {
        Self::new(Vector3::new(
            0.5 * (matrix[(2, 1)] - matrix[(1, 2)]),
            0.5 * (matrix[(0, 2)] - matrix[(2, 0)]),
            0.5 * (matrix[(1, 0)] - matrix[(0, 1)]),
        ))
    }

    /// Get the axis-angle vector.
    pub fn axis_angle(&self) -> Vector3<f64> {
        self.data
    }

    /// Get the angle of rotation.
    pub fn angle(&self) -> f64 {
        self.data.norm()
    }

    /// Get the axis of rotation (normalized).
    ///
    /// Returns `None` for the zero vector, whose axis is undefined.
    pub fn axis(&self) -> Option<Vector3<f64>> {
        let norm = self.data.norm();
        if norm < f64::EPSILON {
            None
        } else {
            Some(self.data / norm)
        }
    }

    /// Exponential map to SO(3).
    ///
    /// # Notes
    /// q = Exp(θu) = cos(θ/2) + u sin(θ/2) ∈ H
    pub fn exp(&self) -> SO3 {
        let theta_squared = self.data.norm_squared();

        let quaternion = if theta_squared > f64::EPSILON {
            UnitQuaternion::from_scaled_axis(self.data)
        } else {
            UnitQuaternion::from_quaternion(Quaternion::new(
                1.0,
                self.data.x / 2.0,
                self.data.y / 2.0,
                self.data.z / 2.0,
            ))
        };

        SO3 { quaternion }
    }

    /// Hat map for SO(3)
    ///
    /// # Notes
    /// [θ]ₓ = [0 -θz θy; θz 0 -θx; -θy θx 0]
    pub fn hat(&self) -> Matrix3<f64> {
        Matrix3::new(
            0.0,
            -self.data.z,
            self.data.y,
            self.data.z,
            0.0,
            -self.data.x,
            -self.data.y,
            self.data.x,
            0.0,
        )
    }
}
