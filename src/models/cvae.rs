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

/// Encode class labels as an `(N, num_classes)` one-hot matrix.
pub fn one_hot(labels: &[usize], num_classes: usize) -> Result<Matrix> {
    let mut m = Matrix::zeros(labels.len(), num_classes);
    for (row, &label) in labels.iter().enumerate() {
        if label >= num_classes {
            return Err(VaeError::LabelOutOfRange { label, num_classes });
        }
        m.set(row, label, 1.0);
    }
    Ok(m)
}

/// Conditional variational autoencoder.
///
/// Both networks see the class condition `c` (one-hot, `(N, num_classes)`):
/// the encoder consumes `[x | c]` and the decoder consumes `[z | c]`.
pub struct CVAE {
    pub input_size: usize,
    pub num_classes: usize,
    pub latent_size: usize,
    pub hidden_dim: usize,
    pub encoder: GaussianEncoder,
    pub decoder: Sequential,
    logvar: Matrix,
    eps: Matrix,
}

impl CVAE {
    pub fn new(input_size: usize, num_classes: usize, latent_size: usize) -> Self {
        let defaults = VaeConfig::default();
        Self::with_dims(
            input_size,
            num_classes,
            defaults.hidden_dim,
            defaults.hidden_layers,
            latent_size,
        )
    }

    pub fn with_dims(
        input_size: usize,
        num_classes: usize,
        hidden_dim: usize,
        hidden_layers: usize,
        latent_size: usize,
    ) -> Self {
        crate::debug!(
            "building CVAE: input {input_size}, classes {num_classes}, hidden {hidden_layers}x{hidden_dim}, latent {latent_size}"
        );
        Self {
            input_size,
            num_classes,
            latent_size,
            hidden_dim,
            encoder: GaussianEncoder::new(
                input_size + num_classes,
                hidden_dim,
                hidden_layers,
                latent_size,
            ),
            decoder: Sequential::dense_sigmoid_head(
                latent_size + num_classes,
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
            cfg.num_classes,
            cfg.hidden_dim,
            cfg.hidden_layers,
            cfg.latent_size,
        ))
    }

    fn check_condition(&self, op: &'static str, rows: usize, c: &Matrix) -> Result<()> {
        c.ensure_shape(op, (rows, self.num_classes))
    }

    pub fn encode(&self, x: &Matrix, c: &Matrix) -> Result<(Matrix, Matrix)> {
        ensure_width("CVAE::encode", x, self.input_size)?;
        self.check_condition("CVAE::encode", x.rows, c)?;
        Ok(self.encoder.forward(&Matrix::concat_cols(x, c)))
    }

    pub fn decode(&self, z: &Matrix, c: &Matrix) -> Result<Matrix> {
        ensure_width("CVAE::decode", z, self.latent_size)?;
        self.check_condition("CVAE::decode", z.rows, c)?;
        Ok(self.decoder.forward(&Matrix::concat_cols(z, c)))
    }

    /// Returns `(x_hat, mu, logvar)` for inputs `x` and conditions `c`.
    pub fn forward(&self, x: &Matrix, c: &Matrix) -> Result<(Matrix, Matrix, Matrix)> {
        let (mu, logvar) = self.encode(x, c)?;
        let (z, _) = reparametrize_with_rng(&mu, &logvar, &mut rng_from_env())?;
        let x_hat = self.decoder.forward(&Matrix::concat_cols(&z, c));
        Ok((x_hat, mu, logvar))
    }

    pub fn forward_train(&mut self, x: &Matrix, c: &Matrix) -> Result<(Matrix, Matrix, Matrix)> {
        let eps = sample_standard_normal(x.rows, self.latent_size, &mut rng_from_env());
        self.forward_train_with_noise(x, c, &eps)
    }

    pub fn forward_train_with_noise(
        &mut self,
        x: &Matrix,
        c: &Matrix,
        eps: &Matrix,
    ) -> Result<(Matrix, Matrix, Matrix)> {
        ensure_width("CVAE::forward_train", x, self.input_size)?;
        self.check_condition("CVAE::forward_train", x.rows, c)?;
        eps.ensure_shape("CVAE::forward_train", (x.rows, self.latent_size))?;
        let (mu, logvar) = self.encoder.forward_train(&Matrix::concat_cols(x, c));
        let z = reparametrize_with_noise(&mu, &logvar, eps)?;
        self.logvar = logvar.clone();
        self.eps = eps.clone();
        let x_hat = self.decoder.forward_train(&Matrix::concat_cols(&z, c));
        Ok((x_hat, mu, logvar))
    }

    pub fn backward(&mut self, grads: &LossGrads) -> Result<()> {
        let n = self.eps.rows;
        grads
            .x_hat
            .ensure_shape("CVAE::backward", (n, self.input_size))?;
        grads.mu.ensure_shape("CVAE::backward", (n, self.latent_size))?;
        grads
            .logvar
            .ensure_shape("CVAE::backward", (n, self.latent_size))?;
        if n == 0 {
            return Err(VaeError::EmptyBatch {
                op: "CVAE::backward",
            });
        }

        // the condition columns carry no trainable upstream
        let grad_zc = self.decoder.backward(&grads.x_hat);
        let grad_z = grad_zc.slice_cols(0, self.latent_size);
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

    /// Generate one image per label from prior draws. No labels yield an
    /// empty `(0, input_size)` matrix.
    pub fn sample<R: Rng>(&self, labels: &[usize], rng: &mut R) -> Result<Matrix> {
        let c = one_hot(labels, self.num_classes)?;
        if labels.is_empty() {
            return Ok(Matrix::zeros(0, self.input_size));
        }
        let z = sample_standard_normal(labels.len(), self.latent_size, rng);
        self.decode(&z, &c)
    }
}
