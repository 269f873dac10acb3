use crate::config::VaeConfig;
use crate::error::{Result, VaeError};
use crate::layers::LinearT;
use crate::math::{LossGrads, Matrix};
use crate::rng::rng_from_env;
use rand::Rng;

use super::encoder::GaussianEncoder;
use super::latent::{
    ensure_width, reparam_backward, reparametrize_with_noise, reparametrize_with_rng,
    sample_standard_normal,
};
use super::sequential::Sequential;

/// Fully-connected variational autoencoder.
///
/// Images enter row-flattened as an `(N, input_size)` matrix. The encoder is
/// `input_size -> hidden_dim` followed by further `hidden_dim` ReLU layers and
/// the mean/log-variance heads; the decoder mirrors it and ends in a sigmoid
/// so reconstructions lie in `(0, 1)`.
pub struct VAE {
    pub input_size: usize,
    pub latent_size: usize,
    pub hidden_dim: usize,
    pub encoder: GaussianEncoder,
    pub decoder: Sequential,
    // caches for backward
    logvar: Matrix,
    eps: Matrix,
}

impl VAE {
    /// Build the default architecture (three hidden layers of width 600) for
    /// the given input and latent sizes.
    pub fn new(input_size: usize, latent_size: usize) -> Self {
        let defaults = VaeConfig::default();
        Self::with_dims(
            input_size,
            defaults.hidden_dim,
            defaults.hidden_layers,
            latent_size,
        )
    }

    pub fn with_dims(
        input_size: usize,
        hidden_dim: usize,
        hidden_layers: usize,
        latent_size: usize,
    ) -> Self {
        crate::debug!(
            "building VAE: input {input_size}, hidden {hidden_layers}x{hidden_dim}, latent {latent_size}"
        );
        Self {
            input_size,
            latent_size,
            hidden_dim,
            encoder: GaussianEncoder::new(input_size, hidden_dim, hidden_layers, latent_size),
            decoder: Sequential::dense_sigmoid_head(
                latent_size,
                hidden_dim,
                hidden_layers,
                input_size,
            ),
            logvar: Matrix::zeros(0, 0),
            eps: Matrix::zeros(0, 0),
        }
    }

    pub fn from_config(cfg: &VaeConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self::with_dims(
            cfg.input_size,
            cfg.hidden_dim,
            cfg.hidden_layers,
            cfg.latent_size,
        ))
    }

    /// Posterior mean and log-variance, each `(N, latent_size)`.
    pub fn encode(&self, x: &Matrix) -> Result<(Matrix, Matrix)> {
        ensure_width("VAE::encode", x, self.input_size)?;
        Ok(self.encoder.forward(x))
    }

    /// Map latent vectors `(N, latent_size)` to reconstructions
    /// `(N, input_size)`.
    pub fn decode(&self, z: &Matrix) -> Result<Matrix> {
        ensure_width("VAE::decode", z, self.latent_size)?;
        Ok(self.decoder.forward(z))
    }

    /// Encode, reparametrize and decode. Returns `(x_hat, mu, logvar)`.
    pub fn forward(&self, x: &Matrix) -> Result<(Matrix, Matrix, Matrix)> {
        let (mu, logvar) = self.encode(x)?;
        let (z, _) = reparametrize_with_rng(&mu, &logvar, &mut rng_from_env())?;
        let x_hat = self.decoder.forward(&z);
        Ok((x_hat, mu, logvar))
    }

    /// Training forward pass; caches activations and the sampled noise for
    /// [`VAE::backward`].
    pub fn forward_train(&mut self, x: &Matrix) -> Result<(Matrix, Matrix, Matrix)> {
        let eps = sample_standard_normal(x.rows, self.latent_size, &mut rng_from_env());
        self.forward_train_with_noise(x, &eps)
    }

    /// Training forward pass with caller-provided noise `eps`
    /// `(N, latent_size)`.
    pub fn forward_train_with_noise(
        &mut self,
        x: &Matrix,
        eps: &Matrix,
    ) -> Result<(Matrix, Matrix, Matrix)> {
        ensure_width("VAE::forward_train", x, self.input_size)?;
        eps.ensure_shape("VAE::forward_train", (x.rows, self.latent_size))?;
        let (mu, logvar) = self.encoder.forward_train(x);
        let z = reparametrize_with_noise(&mu, &logvar, eps)?;
        self.logvar = logvar.clone();
        self.eps = eps.clone();
        let x_hat = self.decoder.forward_train(&z);
        Ok((x_hat, mu, logvar))
    }

    /// Accumulate parameter gradients for the last training forward pass.
    pub fn backward(&mut self, grads: &LossGrads) -> Result<()> {
        let n = self.eps.rows;
        grads
            .x_hat
            .ensure_shape("VAE::backward", (n, self.input_size))?;
        grads.mu.ensure_shape("VAE::backward", (n, self.latent_size))?;
        grads
            .logvar
            .ensure_shape("VAE::backward", (n, self.latent_size))?;
        if n == 0 {
            return Err(VaeError::EmptyBatch { op: "VAE::backward" });
        }

        let grad_z = self.decoder.backward(&grads.x_hat);
        let (grad_mu_z, grad_logvar_z) = reparam_backward(&grad_z, &self.logvar, &self.eps);
        let grad_mu = grad_mu_z.add(&grads.mu);
        let grad_logvar = grad_logvar_z.add(&grads.logvar);
        self.encoder.backward(&grad_mu, &grad_logvar);
        Ok(())
    }

    pub fn zero_grad(&mut self) {
        self.encoder.zero_grad();
        self.decoder.zero_grad();
    }

    pub fn parameters(&mut self) -> Vec<&mut LinearT> {
        let mut params = self.encoder.parameters();
        params.extend(self.decoder.parameters());
        params
    }

    /// Decode `n` draws from the standard-normal prior. `n == 0` yields an
    /// empty `(0, input_size)` matrix.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Matrix> {
        if n == 0 {
            return Ok(Matrix::zeros(0, self.input_size));
        }
        let z = sample_standard_normal(n, self.latent_size, rng);
        self.decode(&z)
    }
}
