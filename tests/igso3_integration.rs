//! End-to-end tests of the public IGSO(3) API: table contract, CDF properties,
//! limit behaviour and sampling.

use std::f64::consts::PI;
use std::sync::Arc;

use igso3::manifold::{self, SO3};
use igso3::{
    Igso3Error, Igso3Table, SeriesConfig, TableConfig, calculate_igso3, igso3_density_angle,
    igso3_score,
};
use nalgebra::Vector3;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_table_shape_contract() {
    let table = calculate_igso3(2, 4, 0.1, 1.0).expect("valid configuration");

    assert_eq!(table.cdf.shape(), (2, 4));
    assert_eq!(table.score_norm.shape(), (2, 4));
    assert_eq!(table.exp_score_norms.len(), 2);
    assert_eq!(table.discrete_omega.len(), 4);
    assert_eq!(table.discrete_sigma.len(), 2);

    for w in table.discrete_omega.iter() {
        assert!(*w > 0.0 && *w <= PI);
    }
    for s in table.discrete_sigma.iter() {
        assert!(*s > 0.1 && *s <= 1.0);
    }
    assert!(table.discrete_sigma[1] > table.discrete_sigma[0]);

    for v in table.cdf.iter().chain(table.score_norm.iter()) {
        assert!(v.is_finite());
    }
}

#[test]
fn test_degenerate_inputs_rejected() {
    assert!(matches!(
        calculate_igso3(0, 4, 0.1, 1.0),
        Err(Igso3Error::InvalidParameter(_))
    ));
    assert!(matches!(
        calculate_igso3(2, 4, -1.0, 1.0),
        Err(Igso3Error::InvalidParameter(_))
    ));
    assert!(matches!(
        calculate_igso3(2, 4, 1.0, 0.1),
        Err(Igso3Error::InvalidParameter(_))
    ));
    assert!(matches!(
        calculate_igso3(2, 0, 0.1, 1.0),
        Err(Igso3Error::InvalidParameter(_))
    ));
}

#[test]
fn test_cdf_is_monotone() {
    let table = calculate_igso3(12, 200, 0.02, 1.5).expect("valid configuration");
    for i in 0..table.num_sigma() {
        let row = table.cdf.row(i);
        for j in 1..table.num_omega() {
            assert!(row[j] >= row[j - 1], "row {i} decreases at column {j}");
        }
        assert!(row[0] >= 0.0);
    }
}

#[test]
fn test_cdf_normalization_converges() {
    let sigma_config = |num_omega| TableConfig::new(3, num_omega, 0.2, 1.2);
    let mut last_mass = Vec::new();
    for &num_omega in &[100, 400, 1600] {
        let table = Igso3Table::build(&sigma_config(num_omega)).expect("valid configuration");
        let masses: Vec<f64> = (0..3).map(|i| table.cdf[(i, num_omega - 1)]).collect();
        last_mass.push(masses);
    }

    for i in 0..3 {
        let errors: Vec<f64> = last_mass.iter().map(|m| (m[i] - 1.0).abs()).collect();
        // rows whose density vanishes at π are already exact to rounding at 100 points
        assert!(errors[2] <= errors[0] + 1e-12);
        assert!(errors[2] < 1e-3, "sigma row {i}: {errors:?}");
    }
}

#[test]
fn test_expected_score_norm_shrinks_with_noise() {
    let table = calculate_igso3(10, 500, 0.1, 3.0).expect("valid configuration");
    let norms = &table.exp_score_norms;
    let first = norms[0];
    let last = norms[norms.len() - 1];

    assert!(last < first);
    assert!(last < 0.05 * first);
    for i in 1..norms.len() {
        assert!(norms[i] < norms[i - 1]);
    }
}

#[test]
fn test_high_noise_marginal_is_haar() {
    let omegas: Vec<f64> = (1..=50).map(|i| PI * i as f64 / 50.0).collect();
    let pdf = igso3_density_angle(&omegas, 40.0, &SeriesConfig::default()).expect("valid");
    for (omega, p) in omegas.iter().zip(pdf.iter()) {
        let haar = (1.0 - omega.cos()) / PI;
        assert!((p - haar).abs() < 1e-8);
    }
}

#[test]
fn test_sampled_angles_follow_the_cdf() {
    let table = calculate_igso3(4, 1000, 0.1, 1.0).expect("valid configuration");
    let sigma = table.discrete_sigma[1];
    let row = table.sigma_index(sigma).expect("positive sigma");
    let mut rng = StdRng::seed_from_u64(2024);

    let n = 4000;
    let samples: Vec<f64> = (0..n)
        .map(|_| table.sample_rotvec(sigma, &mut rng).expect("valid").norm())
        .collect();

    // empirical CDF at the grid median versus the tabulated value
    let median_col = table
        .cdf
        .row(row)
        .iter()
        .position(|c| *c >= 0.5)
        .expect("mass reaches 0.5");
    let threshold = table.discrete_omega[median_col];
    let below = samples.iter().filter(|w| **w <= threshold).count() as f64 / n as f64;
    assert!((below - table.cdf[(row, median_col)]).abs() < 0.05);
}

#[test]
fn test_sampled_axes_are_isotropic() {
    let table = calculate_igso3(2, 256, 0.1, 1.0).expect("valid configuration");
    let mut rng = StdRng::seed_from_u64(99);
    let mut mean_axis = Vector3::zeros();
    let n = 2000;
    for _ in 0..n {
        let v = table.sample_rotvec(0.5, &mut rng).expect("valid");
        mean_axis += v / v.norm();
    }
    mean_axis /= n as f64;
    assert!(mean_axis.norm() < 0.1);
}

#[test]
fn test_sampled_rotations_match_their_rotation_vectors() {
    let table = calculate_igso3(2, 256, 0.1, 1.0).expect("valid configuration");
    let mut a = StdRng::seed_from_u64(5);
    let mut b = StdRng::seed_from_u64(5);
    for _ in 0..20 {
        let rotation = table.sample(0.4, &mut a).expect("valid");
        let rotvec = table.sample_rotvec(0.4, &mut b).expect("valid");
        let omega = manifold::omega(&[rotation])[0];
        assert!((omega - rotvec.norm()).abs() < 1e-8);
    }
}

#[test]
fn test_table_score_agrees_with_matrix_score() {
    let table = calculate_igso3(3, 2000, 0.2, 1.0).expect("valid configuration");
    let sigma = table.discrete_sigma[2];
    let rotvec = table.discrete_omega[700] * Vector3::new(0.0, 0.6, 0.8);
    let rotation = SO3::from_scaled_axis(rotvec).rotation_matrix();

    let matrix_score = igso3_score(&[rotation], sigma * sigma, &SeriesConfig::default())
        .expect("valid")[0];
    let vector_score = table.score_vector(sigma, &rotvec).expect("valid");

    // body-frame matrix score is hat(vector score)
    let body = rotation.transpose() * matrix_score;
    let expected = manifold::hat(&[vector_score])[0];
    assert!((body - expected).norm() < 1e-6 * expected.norm());
}

#[test]
fn test_table_is_shareable_across_threads() {
    let table = Arc::new(calculate_igso3(4, 128, 0.1, 1.0).expect("valid configuration"));
    let handles: Vec<_> = (0..4)
        .map(|k| {
            let table = Arc::clone(&table);
            std::thread::spawn(move || table.sample_omega(0.5, k as f64 / 4.0))
        })
        .collect();
    for handle in handles {
        let omega = handle.join().expect("thread completes").expect("valid variate");
        assert!(omega > 0.0 && omega <= PI);
    }
}

#[test]
fn test_builds_are_deterministic() {
    let config = TableConfig::new(6, 64, 0.05, 1.5).with_truncation(500);
    let a = Igso3Table::build(&config).expect("valid configuration");
    let b = Igso3Table::build(&config).expect("valid configuration");
    assert_eq!(a, b);
    assert_eq!(a.config(), &config);
}
