use crate::math::Matrix;
use super::layer::Layer;
use super::linear::LinearT;

/// Apply sigmoid activation in place on a matrix.
pub fn forward_matrix(m: &mut Matrix) {
    for v in m.data.iter_mut() {
        *v = 1.0 / (1.0 + (-*v).exp());
    }
}

/// Multiply gradient with derivative of sigmoid using activated values.
pub fn backward(grad: &mut Matrix, activated: &Matrix) {
    for (g, &h) in grad.data.iter_mut().zip(activated.data.iter()) {
        *g *= h * (1.0 - h);
    }
}

/// Sigmoid output layer; caches its activations for the backward pass.
pub struct SigmoidT {
    out: Matrix,
}

impl SigmoidT {
    pub fn new() -> Self {
        Self {
            out: Matrix::zeros(0, 0),
        }
    }
}

impl Default for SigmoidT {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for SigmoidT {
    fn forward(&self, x: &Matrix) -> Matrix {
        let mut out = x.clone();
        forward_matrix(&mut out);
        out
    }

    fn forward_train(&mut self, x: &Matrix) -> Matrix {
        let mut out = x.clone();
        forward_matrix(&mut out);
        self.out = out.clone();
        out
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let mut grad = grad_out.clone();
        backward(&mut grad, &self.out);
        grad
    }

    fn zero_grad(&mut self) {}

    fn parameters(&mut self) -> Vec<&mut LinearT> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_maps_to_half() {
        let s = SigmoidT::new();
        let out = s.forward(&Matrix::zeros(1, 2));
        assert_eq!(out.data, vec![0.5, 0.5]);
    }

    #[test]
    fn derivative_peaks_at_zero() {
        let mut s = SigmoidT::new();
        s.forward_train(&Matrix::zeros(1, 1));
        let g = s.backward(&Matrix::filled(1, 1, 1.0));
        assert!((g.data[0] - 0.25).abs() < 1e-6);
    }
}
