use crate::error::{Result, VaeError};
use crate::math::Matrix;
use crate::rng::rng_from_env;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Draw a `rows x cols` matrix of independent standard-normal values.
pub fn sample_standard_normal<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
    let data = (0..rows * cols)
        .map(|_| StandardNormal.sample(rng))
        .collect();
    Matrix::from_vec(rows, cols, data)
}

fn check_pair(mu: &Matrix, logvar: &Matrix) -> Result<()> {
    logvar.ensure_shape("reparametrize", mu.shape())
}

/// Reparameterization with caller-provided noise:
/// `z = mu + exp(logvar / 2) * eps`, elementwise.
pub fn reparametrize_with_noise(mu: &Matrix, logvar: &Matrix, eps: &Matrix) -> Result<Matrix> {
    check_pair(mu, logvar)?;
    eps.ensure_shape("reparametrize", mu.shape())?;
    let mut z = Matrix::zeros(mu.rows, mu.cols);
    for i in 0..z.data.len() {
        let std = (0.5 * logvar.data[i]).exp();
        z.data[i] = mu.data[i] + std * eps.data[i];
    }
    Ok(z)
}

/// Sample `z` from `N(mu, exp(logvar))` using `rng`. Returns `(z, eps)` so a
/// training pass can keep the noise for its backward step.
pub fn reparametrize_with_rng<R: Rng>(
    mu: &Matrix,
    logvar: &Matrix,
    rng: &mut R,
) -> Result<(Matrix, Matrix)> {
    check_pair(mu, logvar)?;
    let eps = sample_standard_normal(mu.rows, mu.cols, rng);
    let z = reparametrize_with_noise(mu, logvar, &eps)?;
    Ok((z, eps))
}

/// Differentiably sample latent vectors with the reparameterization trick,
/// drawing the noise from the crate RNG stream (see [`rng_from_env`]).
pub fn reparametrize(mu: &Matrix, logvar: &Matrix) -> Result<Matrix> {
    let (z, _) = reparametrize_with_rng(mu, logvar, &mut rng_from_env())?;
    Ok(z)
}

/// Gradients flowing back through `z = mu + exp(logvar / 2) * eps`:
/// `dz/dmu = 1`, `dz/dlogvar = 0.5 * exp(logvar / 2) * eps`.
pub(crate) fn reparam_backward(grad_z: &Matrix, logvar: &Matrix, eps: &Matrix) -> (Matrix, Matrix) {
    let mut grad_logvar = Matrix::zeros(logvar.rows, logvar.cols);
    for i in 0..grad_logvar.data.len() {
        let std = (0.5 * logvar.data[i]).exp();
        grad_logvar.data[i] = grad_z.data[i] * eps.data[i] * 0.5 * std;
    }
    (grad_z.clone(), grad_logvar)
}

/// Validate a `(N, width)` input against the expected width.
pub(crate) fn ensure_width(op: &'static str, x: &Matrix, width: usize) -> Result<()> {
    if x.rows == 0 {
        return Err(VaeError::EmptyBatch { op });
    }
    x.ensure_shape(op, (x.rows, width))
}
