//! Precomputed IGSO(3) tables over a (sigma, omega) grid.
//!
//! [`Igso3Table::build`] discretizes the rotation angle and the noise scale, evaluates
//! the marginal angle density and the log-density derivative at every grid point, and
//! integrates the density into per-sigma CDFs. The result is what a diffusion
//! pipeline needs at runtime:
//!
//! - `cdf` for inverse-transform sampling of the rotation angle at a given sigma
//! - `score_norm` for the magnitude of the score at a given (sigma, omega)
//! - `exp_score_norms` for scaling score-matching losses across noise levels
//!
//! Tables are immutable once built; share them behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use igso3::table::calculate_igso3;
//!
//! let table = calculate_igso3(2, 4, 0.1, 1.0).unwrap();
//! assert_eq!(table.cdf.shape(), (2, 4));
//! assert_eq!(table.exp_score_norms.len(), 2);
//! ```

use crate::density::{self, SeriesConfig};
use crate::error::{Igso3Error, Igso3Result};
use crate::manifold::SO3Tangent;
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use rand::Rng;
use rayon::prelude::*;
use std::f64::consts::PI;
use std::time::Instant;
use tracing::{debug, info};

/// Configuration of a table build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Number of noise scales
    pub num_sigma: usize,
    /// Number of rotation angles in (0, π]
    pub num_omega: usize,
    /// Lower end of the log-uniform sigma range (excluded from the grid)
    pub min_sigma: f64,
    /// Upper end of the log-uniform sigma range (included in the grid)
    pub max_sigma: f64,
    /// Series truncation used for every evaluation
    pub series: SeriesConfig,
}

impl TableConfig {
    /// Create a configuration with the default series truncation.
    pub fn new(num_sigma: usize, num_omega: usize, min_sigma: f64, max_sigma: f64) -> Self {
        Self {
            num_sigma,
            num_omega,
            min_sigma,
            max_sigma,
            series: SeriesConfig::default(),
        }
    }

    /// Set the series truncation level L
    pub fn with_truncation(mut self, truncation: usize) -> Self {
        self.series = self.series.with_truncation(truncation);
        self
    }

    /// Set the full series configuration
    pub fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series = series;
        self
    }

    /// Reject every configuration that cannot produce a table.
    pub fn validate(&self) -> Igso3Result<()> {
        if self.num_sigma < 1 {
            return Err(Igso3Error::invalid("num_sigma must be at least 1"));
        }
        if self.num_omega < 1 {
            return Err(Igso3Error::invalid("num_omega must be at least 1"));
        }
        if !self.min_sigma.is_finite() || self.min_sigma <= 0.0 {
            return Err(Igso3Error::invalid(format!(
                "min_sigma must be finite and strictly positive, got {}",
                self.min_sigma
            )));
        }
        if !self.max_sigma.is_finite() || self.max_sigma <= self.min_sigma {
            return Err(Igso3Error::invalid(format!(
                "max_sigma must be finite and greater than min_sigma ({}), got {}",
                self.min_sigma, self.max_sigma
            )));
        }
        self.series.validate()
    }

    /// Rotation angles π·i / num_omega for i = 1..=num_omega; zero is skipped.
    pub fn discrete_omega(&self) -> DVector<f64> {
        let n = self.num_omega as f64;
        DVector::from_fn(self.num_omega, |i, _| PI * (i + 1) as f64 / n)
    }

    /// Log-uniform noise scales; min_sigma is skipped, max_sigma is the last entry.
    ///
    /// discrete_sigma[n] = min_sigma^(1 - (n+1)/N) · max_sigma^((n+1)/N)
    pub fn discrete_sigma(&self) -> DVector<f64> {
        let lo = self.min_sigma.log10();
        let hi = self.max_sigma.log10();
        let n = self.num_sigma as f64;
        DVector::from_fn(self.num_sigma, |i, _| {
            10f64.powf(lo + (hi - lo) * (i + 1) as f64 / n)
        })
    }
}

/// Precomputed CDFs and score norms of IGSO(3) over a (sigma, omega) grid.
///
/// Rows are indexed by sigma, columns by omega.
#[derive(Debug, Clone, PartialEq)]
pub struct Igso3Table {
    /// Marginal angle CDF, shape (num_sigma, num_omega)
    pub cdf: DMatrix<f64>,
    /// d log f / dω, shape (num_sigma, num_omega)
    pub score_norm: DMatrix<f64>,
    /// pdf-weighted RMS of `score_norm` per sigma, shape (num_sigma,)
    pub exp_score_norms: DVector<f64>,
    /// Angle grid, shape (num_omega,)
    pub discrete_omega: DVector<f64>,
    /// Noise-scale grid, shape (num_sigma,)
    pub discrete_sigma: DVector<f64>,
    config: TableConfig,
}

/// One sigma row before assembly.
struct Row {
    pdf: Vec<f64>,
    score: Vec<f64>,
}

/// Build the IGSO(3) table with the default truncation level.
///
/// # Arguments
/// * `num_sigma` - number of noise scales
/// * `num_omega` - number of points discretizing the rotation angle
/// * `min_sigma`, `max_sigma` - log-uniform sigma range; a very small `min_sigma` makes
///   the density tails numerically unresolvable
pub fn calculate_igso3(
    num_sigma: usize,
    num_omega: usize,
    min_sigma: f64,
    max_sigma: f64,
) -> Igso3Result<Igso3Table> {
    Igso3Table::build(&TableConfig::new(
        num_sigma, num_omega, min_sigma, max_sigma,
    ))
}

impl Igso3Table {
    /// Build a table. Fails before any evaluation if the configuration is invalid, and
    /// returns no partial table if any grid point is numerically unstable.
    pub fn build(config: &TableConfig) -> Igso3Result<Self> {
        config.validate()?;
        let start = Instant::now();
        info!(
            num_sigma = config.num_sigma,
            num_omega = config.num_omega,
            min_sigma = config.min_sigma,
            max_sigma = config.max_sigma,
            truncation = config.series.truncation,
            "building IGSO(3) table"
        );

        let discrete_omega = config.discrete_omega();
        let discrete_sigma = config.discrete_sigma();

        let rows = discrete_sigma
            .as_slice()
            .par_iter()
            .map(|&sigma| compute_row(sigma, discrete_omega.as_slice(), &config.series))
            .collect::<Igso3Result<Vec<Row>>>()?;

        let num_sigma = config.num_sigma;
        let num_omega = config.num_omega;
        let pdf = DMatrix::from_fn(num_sigma, num_omega, |i, j| rows[i].pdf[j]);
        let score_norm = DMatrix::from_fn(num_sigma, num_omega, |i, j| rows[i].score[j]);

        // Uniform-grid Riemann sum; the weight π / num_omega assumes equal spacing
        let step = PI / num_omega as f64;
        let mut cdf = DMatrix::zeros(num_sigma, num_omega);
        for i in 0..num_sigma {
            let mut acc = 0.0;
            for j in 0..num_omega {
                acc += pdf[(i, j)];
                cdf[(i, j)] = acc * step;
            }
        }

        let mut exp_score_norms = DVector::zeros(num_sigma);
        for i in 0..num_sigma {
            let mass: f64 = pdf.row(i).sum();
            if !(mass > 0.0) {
                return Err(Igso3Error::unstable(format!(
                    "marginal density vanishes on the whole grid for sigma = {}",
                    discrete_sigma[i]
                )));
            }
            let weighted: f64 = pdf
                .row(i)
                .iter()
                .zip(score_norm.row(i).iter())
                .map(|(p, s)| s * s * p)
                .sum();
            exp_score_norms[i] = (weighted / mass).sqrt();
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "IGSO(3) table ready"
        );

        Ok(Self {
            cdf,
            score_norm,
            exp_score_norms,
            discrete_omega,
            discrete_sigma,
            config: *config,
        })
    }

    /// The configuration this table was built from.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Number of rows in the sigma grid.
    pub fn num_sigma(&self) -> usize {
        self.discrete_sigma.len()
    }

    /// Number of columns in the omega grid.
    pub fn num_omega(&self) -> usize {
        self.discrete_omega.len()
    }

    /// Index of the grid sigma closest to `sigma` in log space.
    pub fn sigma_index(&self, sigma: f64) -> Igso3Result<usize> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Igso3Error::invalid(format!(
                "sigma must be finite and strictly positive, got {sigma}"
            )));
        }
        let target = sigma.ln();
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (i, s) in self.discrete_sigma.iter().enumerate() {
            let distance = (s.ln() - target).abs();
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        Ok(best)
    }

    /// Expected score norm of the grid sigma nearest to `sigma`.
    pub fn exp_score_norm(&self, sigma: f64) -> Igso3Result<f64> {
        Ok(self.exp_score_norms[self.sigma_index(sigma)?])
    }

    /// Inverse-transform a uniform variate `u` ∈ [0, 1] into a rotation angle.
    ///
    /// Linearly interpolates `u` against the CDF row of the nearest sigma; values past
    /// either end of the row clamp to the first or last grid angle.
    pub fn sample_omega(&self, sigma: f64, u: f64) -> Igso3Result<f64> {
        if !(0.0..=1.0).contains(&u) {
            return Err(Igso3Error::invalid(format!(
                "uniform variate must lie in [0, 1], got {u}"
            )));
        }
        let row: Vec<f64> = self.cdf.row(self.sigma_index(sigma)?).iter().copied().collect();
        Ok(interp(u, &row, self.discrete_omega.as_slice()))
    }

    /// Sample a rotation vector: uniform axis on the sphere times a sampled angle.
    pub fn sample_rotvec<R: Rng + ?Sized>(
        &self,
        sigma: f64,
        rng: &mut R,
    ) -> Igso3Result<Vector3<f64>> {
        let omega = self.sample_omega(sigma, rng.random::<f64>())?;

        let z: f64 = 2.0 * rng.random::<f64>() - 1.0;
        let phi: f64 = 2.0 * PI * rng.random::<f64>();
        let r = (1.0 - z * z).max(0.0).sqrt();
        let axis = Vector3::new(r * phi.cos(), r * phi.sin(), z);

        Ok(axis * omega)
    }

    /// Sample a rotation matrix from IGSO(3) at the nearest grid sigma.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        sigma: f64,
        rng: &mut R,
    ) -> Igso3Result<Matrix3<f64>> {
        let rotvec = self.sample_rotvec(sigma, rng)?;
        Ok(SO3Tangent::new(rotvec).exp().rotation_matrix())
    }

    /// Score norm at `omega` for the nearest grid sigma, linearly interpolated in omega.
    pub fn score_norm_at(&self, sigma: f64, omega: f64) -> Igso3Result<f64> {
        density::check_omega(omega)?;
        let row: Vec<f64> = self
            .score_norm
            .row(self.sigma_index(sigma)?)
            .iter()
            .copied()
            .collect();
        Ok(interp(omega, self.discrete_omega.as_slice(), &row))
    }

    /// Score with respect to a rotation vector: its unit axis times the score norm.
    pub fn score_vector(&self, sigma: f64, rotvec: &Vector3<f64>) -> Igso3Result<Vector3<f64>> {
        let omega = rotvec.norm();
        let axis = SO3Tangent::new(*rotvec)
            .axis()
            .ok_or_else(|| Igso3Error::domain("score is undefined at the zero rotation"))?;
        Ok(axis * self.score_norm_at(sigma, omega)?)
    }
}

fn compute_row(sigma: f64, omegas: &[f64], series: &SeriesConfig) -> Igso3Result<Row> {
    let t = sigma * sigma;
    let mut pdf = Vec::with_capacity(omegas.len());
    let mut score = Vec::with_capacity(omegas.len());

    for &omega in omegas {
        let sums = density::kernel_at(omega, t, series)?;
        pdf.push(density::marginal(sums.density, omega));
        score.push(density::log_derivative_at(&sums, omega, t)?);
    }

    debug!(sigma, "row done");
    Ok(Row { pdf, score })
}

/// Piecewise-linear interpolation of (xp, fp) at x, clamped at both ends.
///
/// `xp` must be non-decreasing; flat runs resolve to their last point.
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len();
    if n == 0 {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // first index with xp[j] > x; 1 <= j <= n-1 here
    let j = xp.partition_point(|&v| v <= x);
    let (x0, x1) = (xp[j - 1], xp[j]);
    let (f0, f1) = (fp[j - 1], fp[j]);
    f0 + (f1 - f0) * (x - x0) / (x1 - x0)
}
