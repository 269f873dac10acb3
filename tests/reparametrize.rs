use vanillavae::math::Matrix;
use vanillavae::models::{reparametrize, reparametrize_with_noise, reparametrize_with_rng};
use vanillavae::rng::rng_from_seed;
use vanillavae::VaeError;

#[test]
fn fixed_noise_follows_formula() {
    let mu = Matrix::from_vec(2, 2, vec![0.0, 1.0, -2.0, 0.5]);
    let logvar = Matrix::from_vec(2, 2, vec![0.0, 2.0f32.ln(), -1.0, 4.0]);
    let eps = Matrix::from_vec(2, 2, vec![1.0, -1.0, 0.5, 2.0]);
    let z = reparametrize_with_noise(&mu, &logvar, &eps).unwrap();
    for i in 0..4 {
        let expected = mu.data[i] + (logvar.data[i] / 2.0).exp() * eps.data[i];
        assert!((z.data[i] - expected).abs() < 1e-6);
    }
}

#[test]
fn zero_logvar_adds_noise_directly() {
    let mu = Matrix::from_vec(1, 3, vec![0.5, -0.5, 3.0]);
    let logvar = Matrix::zeros(1, 3);
    let eps = Matrix::from_vec(1, 3, vec![0.1, 0.2, -0.3]);
    let z = reparametrize_with_noise(&mu, &logvar, &eps).unwrap();
    assert_eq!(z, mu.add(&eps));
}

#[test]
fn sampled_noise_is_returned_with_z() {
    let mu = Matrix::from_vec(1, 2, vec![1.0, -1.0]);
    let logvar = Matrix::from_vec(1, 2, vec![0.5, -0.5]);
    let (z, eps) = reparametrize_with_rng(&mu, &logvar, &mut rng_from_seed(11)).unwrap();
    assert_eq!(z, reparametrize_with_noise(&mu, &logvar, &eps).unwrap());
}

#[test]
fn seeded_sampling_is_reproducible() {
    let mu = Matrix::zeros(3, 4);
    let logvar = Matrix::zeros(3, 4);
    let (a, _) = reparametrize_with_rng(&mu, &logvar, &mut rng_from_seed(5)).unwrap();
    let (b, _) = reparametrize_with_rng(&mu, &logvar, &mut rng_from_seed(5)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn samples_match_requested_moments() {
    let n = 20_000;
    let mu = Matrix::filled(n, 1, 2.0);
    let logvar = Matrix::filled(n, 1, 4.0f32.ln());
    let (z, _) = reparametrize_with_rng(&mu, &logvar, &mut rng_from_seed(42)).unwrap();
    let mean = z.sum() / n as f32;
    let var = z.data.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n as f32;
    assert!((mean - 2.0).abs() < 0.1, "mean {mean}");
    assert!((var.sqrt() - 2.0).abs() < 0.1, "std {}", var.sqrt());
}

#[test]
fn env_sampling_keeps_shape() {
    let mu = Matrix::zeros(5, 3);
    let z = reparametrize(&mu, &Matrix::zeros(5, 3)).unwrap();
    assert_eq!(z.shape(), (5, 3));
}

#[test]
fn mismatched_shapes_are_rejected() {
    let mu = Matrix::zeros(2, 3);
    let logvar = Matrix::zeros(2, 2);
    assert!(matches!(
        reparametrize(&mu, &logvar),
        Err(VaeError::ShapeMismatch { .. })
    ));
    let eps = Matrix::zeros(3, 3);
    assert!(matches!(
        reparametrize_with_noise(&mu, &Matrix::zeros(2, 3), &eps),
        Err(VaeError::ShapeMismatch { .. })
    ));
}
