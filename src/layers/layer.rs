use crate::math::Matrix;
use super::linear::LinearT;

/// Common interface for network layers.
pub trait Layer {
    /// Forward pass used during inference.
    fn forward(&self, x: &Matrix) -> Matrix;

    /// Forward pass used during training, allowing the layer to cache values
    /// required by the backward pass.
    fn forward_train(&mut self, x: &Matrix) -> Matrix;

    /// Backward pass returning gradient with respect to the layer input.
    fn backward(&mut self, grad_out: &Matrix) -> Matrix;

    /// Zero any accumulated gradients.
    fn zero_grad(&mut self);

    /// Retrieve mutable references to parameters for optimisation.
    fn parameters(&mut self) -> Vec<&mut LinearT>;
}
