use crate::layers::{Layer, LinearT, ReLUT, SigmoidT};
use crate::math::Matrix;

/// A simple container that applies layers sequentially.
pub struct Sequential {
    /// Ordered list of layers.
    pub layers: Vec<Box<dyn Layer>>,
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequential {
    /// Create an empty sequential model.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Stack of `depth` dense layers of width `width`, each followed by ReLU.
    pub fn dense_stack(in_dim: usize, width: usize, depth: usize) -> Self {
        let mut seq = Self::new();
        let mut current = in_dim;
        for _ in 0..depth {
            seq.add_layer(Box::new(LinearT::new(current, width)));
            seq.add_layer(Box::new(ReLUT::new()));
            current = width;
        }
        seq
    }

    /// Dense/ReLU stack followed by a dense projection to `out_dim` squashed
    /// through a sigmoid.
    pub fn dense_sigmoid_head(in_dim: usize, width: usize, depth: usize, out_dim: usize) -> Self {
        let mut seq = Self::dense_stack(in_dim, width, depth);
        let last = if depth == 0 { in_dim } else { width };
        seq.add_layer(Box::new(LinearT::new(last, out_dim)));
        seq.add_layer(Box::new(SigmoidT::new()));
        seq
    }

    /// Append a layer to the sequence.
    pub fn add_layer(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Forward pass used during inference.
    pub fn forward(&self, x: &Matrix) -> Matrix {
        let mut out = x.clone();
        for layer in &self.layers {
            out = layer.forward(&out);
        }
        out
    }

    /// Forward pass used during training.
    pub fn forward_train(&mut self, x: &Matrix) -> Matrix {
        let mut out = x.clone();
        for layer in self.layers.iter_mut() {
            out = layer.forward_train(&out);
        }
        out
    }

    /// Backward pass returning gradient with respect to the input.
    pub fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let mut grad = grad_out.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad);
        }
        grad
    }

    /// Zero any accumulated gradients in all layers.
    pub fn zero_grad(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.zero_grad();
        }
    }

    pub fn parameters(&mut self) -> Vec<&mut LinearT> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.parameters())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_stack_layout() {
        let mut seq = Sequential::dense_stack(4, 8, 3);
        assert_eq!(seq.len(), 6);
        assert_eq!(seq.parameters().len(), 3);
        let out = seq.forward(&Matrix::zeros(2, 4));
        assert_eq!(out.shape(), (2, 8));
    }

    #[test]
    fn sigmoid_head_outputs_probabilities() {
        let seq = Sequential::dense_sigmoid_head(3, 5, 2, 4);
        let out = seq.forward(&Matrix::filled(2, 3, 10.0));
        assert_eq!(out.shape(), (2, 4));
        assert!(out.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
