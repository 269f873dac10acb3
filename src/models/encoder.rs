use crate::layers::{Layer, LinearT};
use crate::math::Matrix;

use super::sequential::Sequential;

/// Dense encoder producing the parameters of a diagonal Gaussian posterior.
///
/// A ReLU stack maps the input to hidden features of width `hidden_dim`; two
/// independent linear heads project those features to the posterior mean and
/// log-variance.
pub struct GaussianEncoder {
    pub body: Sequential,
    pub mu_layer: LinearT,
    pub logvar_layer: LinearT,
    in_dim: usize,
}

impl GaussianEncoder {
    pub fn new(in_dim: usize, hidden_dim: usize, hidden_layers: usize, latent_size: usize) -> Self {
        let feat_dim = if hidden_layers == 0 { in_dim } else { hidden_dim };
        Self {
            body: Sequential::dense_stack(in_dim, hidden_dim, hidden_layers),
            mu_layer: LinearT::new(feat_dim, latent_size),
            logvar_layer: LinearT::new(feat_dim, latent_size),
            in_dim,
        }
    }

    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    pub fn latent_size(&self) -> usize {
        self.mu_layer.out_dim()
    }

    pub fn forward(&self, x: &Matrix) -> (Matrix, Matrix) {
        let h = self.body.forward(x);
        (self.mu_layer.forward(&h), self.logvar_layer.forward(&h))
    }

    pub fn forward_train(&mut self, x: &Matrix) -> (Matrix, Matrix) {
        let h = self.body.forward_train(x);
        let mu = self.mu_layer.forward_train(&h);
        let logvar = self.logvar_layer.forward_train(&h);
        (mu, logvar)
    }

    /// Push gradients for `mu` and `logvar` through both heads and the body.
    pub fn backward(&mut self, grad_mu: &Matrix, grad_logvar: &Matrix) -> Matrix {
        let grad_h_mu = self.mu_layer.backward(grad_mu);
        let grad_h_logvar = self.logvar_layer.backward(grad_logvar);
        self.body.backward(&grad_h_mu.add(&grad_h_logvar))
    }

    pub fn zero_grad(&mut self) {
        self.body.zero_grad();
        self.mu_layer.zero_grad();
        self.logvar_layer.zero_grad();
    }

    pub fn parameters(&mut self) -> Vec<&mut LinearT> {
        let mut params = self.body.parameters();
        params.push(&mut self.mu_layer);
        params.push(&mut self.logvar_layer);
        params
    }
}
