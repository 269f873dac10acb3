//! Fully-connected variational autoencoders on a small dense-layer toolkit.
//!
//! [`models::VAE`] and [`models::CVAE`] encode row-flattened images into a
//! diagonal Gaussian posterior, sample a latent code with
//! [`models::reparametrize`] and decode it back through a sigmoid output.
//! [`math::loss_function`] is the batch-averaged negative ELBO;
//! [`math::loss_with_grads`] also returns the gradients the models'
//! `backward` passes consume.

pub mod config;
pub mod error;
pub mod layers;
pub mod math;
pub mod models;
pub mod optim;
pub mod rng;
pub mod util;

pub use config::VaeConfig;
pub use error::{Result, VaeError};
pub use math::{bce_function, kl_divergence, loss_function, loss_with_grads, Matrix};
pub use models::{reparametrize, CVAE, VAE};
