pub mod cvae;
pub mod encoder;
pub mod latent;
pub mod sequential;
pub mod vae;

pub use cvae::{one_hot, CVAE};
pub use encoder::GaussianEncoder;
pub use latent::{
    reparametrize, reparametrize_with_noise, reparametrize_with_rng, sample_standard_normal,
};
pub use sequential::Sequential;
pub use vae::VAE;
