//! # igso3
//!
//! Numerical kernel for the isotropic Gaussian distribution on SO(3) (IGSO(3)), the
//! heat kernel used to drive diffusion processes over rotations.
//!
//! ## Features
//!
//! - **Manifold maps**: hat/vee, rotation-vector logarithm, matrix logarithm,
//!   exponential map and rotation angle on batches of nalgebra matrices
//! - **Density and score**: truncated-series density, its marginal over the rotation
//!   angle, the closed-form log-density derivative and the matrix-valued score
//! - **Precomputed tables**: per-sigma CDFs, score norms and expected score norms over a
//!   log-uniform noise schedule, with inverse-transform sampling on top
//!
//! ## Conventions
//!
//! The variance is t = σ². Angles are measured under the canonical inner product
//! ⟨u, v⟩ = Trace(u vᵀ) / 2 on so(3), so the rotation angle ω lies in [0, π] and the
//! density is taken with respect to the normalized Haar measure.
//!
//! ## Example
//!
//! ```rust
//! use igso3::{calculate_igso3, f_igso3, SeriesConfig};
//!
//! let config = SeriesConfig::default();
//! let density = f_igso3(&[0.5, 1.0], 0.25, &config).unwrap();
//! assert!(density[0] > density[1]);
//!
//! let table = calculate_igso3(8, 256, 0.1, 1.5).unwrap();
//! let omega = table.sample_omega(0.7, 0.5).unwrap();
//! assert!(omega > 0.0);
//! ```

pub mod density;
pub mod error;
pub mod logger;
pub mod manifold;
pub mod score;
pub mod table;

pub use density::{
    DEFAULT_TRUNCATION, SeriesConfig, d_logf_d_omega, f_igso3, igso3_density,
    igso3_density_angle,
};
pub use error::{Igso3Error, Igso3Result};
pub use logger::{init_logger, init_logger_with_level};
pub use manifold::{SO3, SO3Tangent};
pub use score::igso3_score;
pub use table::{Igso3Table, TableConfig, calculate_igso3};
