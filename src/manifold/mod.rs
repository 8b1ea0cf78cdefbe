//! Elementary SO(3) ⇄ so(3) conversions on batches.
//!
//! Lie group M,° | size   | dim | X ∈ M | Constraint | T_E M         | T_X M     | Exp(T)        | Comp. | Action
//! ------------- | ------ | --- | ----- | ---------- | ------------- | --------- | ------------- | ----- | ------
//! Rotation      | SO(3),.| 9   | R     | RᵀR = I    | [θ]x ∈ so(3)  | [θ] ∈ R³  | R = exp([θ]x) | R₁R₂  | Rx
//!
//! The functions here operate on slices (batches) of nalgebra fixed-size types and
//! return one output per input, in order:
//!
//! - [`hat`]: R³ → so(3), the skew-symmetric matrix of a vector
//! - [`vee`]: so(3) → R³, inverse of [`hat`]
//! - [`log`]: SO(3) → R³, the rotation vector (angle in [0, π])
//! - [`log_matrix`]: SO(3) → so(3), the matrix logarithm `hat(log(R))`
//! - [`exp`]: R³ → SO(3), the rotation matrix of a rotation vector
//! - [`omega`]: SO(3) → [0, π], the geodesic rotation angle
//!
//! Rotation matrix inputs are assumed to be (approximately) orthonormal with
//! determinant +1. This is a precondition, not a runtime check.
//!
//! # Example
//!
//! ```rust
//! use igso3::manifold;
//! use nalgebra::Vector3;
//!
//! let rotvecs = vec![Vector3::new(0.1, -0.2, 0.3)];
//! let rotations = manifold::exp(&rotvecs);
//! let recovered = manifold::log(&rotations);
//! assert!((recovered[0] - rotvecs[0]).norm() < 1e-10);
//! ```

use nalgebra::{Matrix3, Vector3};

pub mod so3;

pub use so3::{SO3, SO3Tangent};

/// Hat map: each vector to its skew-symmetric matrix.
pub fn hat(vectors: &[Vector3<f64>]) -> Vec<Matrix3<f64>> {
    vectors
        .iter()
        .map(|v| SO3Tangent::new(*v).hat())
        .collect()
}

/// Vee map: each skew-symmetric matrix back to its vector.
pub fn vee(matrices: &[Matrix3<f64>]) -> Vec<Vector3<f64>> {
    matrices
        .iter()
        .map(|m| SO3Tangent::vee(m).axis_angle())
        .collect()
}

/// Logarithmic map: rotation matrices to rotation vectors.
pub fn log(rotations: &[Matrix3<f64>]) -> Vec<Vector3<f64>> {
    rotations
        .iter()
        .map(|r| SO3::from_matrix(r).log().axis_angle())
        .collect()
}

/// Matrix logarithm: rotation matrices to elements of so(3).
pub fn log_matrix(rotations: &[Matrix3<f64>]) -> Vec<Matrix3<f64>> {
    rotations
        .iter()
        .map(|r| SO3::from_matrix(r).log_matrix())
        .collect()
}

/// Exponential map: rotation vectors to rotation matrices.
///
/// The zero vector maps to the identity.
pub fn exp(rotvecs: &[Vector3<f64>]) -> Vec<Matrix3<f64>> {
    rotvecs
        .iter()
        .map(|v| SO3Tangent::new(*v).exp().rotation_matrix())
        .collect()
}

/// Rotation angle of each matrix, in [0, π].
pub fn omega(rotations: &[Matrix3<f64>]) -> Vec<f64> {
    rotations
        .iter()
        .map(|r| SO3::from_matrix(r).omega())
        .collect()
}
